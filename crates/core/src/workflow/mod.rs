//! Document workflows for vouchers and invoices.
//!
//! # Modules
//!
//! - `voucher` - approval and payment states, line totals, edit rules
//! - `invoice` - two-stage approval and fund return

pub mod invoice;
pub mod voucher;

#[cfg(test)]
mod transition_props;

pub use invoice::{InvoiceApproval, validate_invoice};
pub use voucher::{
    PaymentStatus, VoucherApproval, ensure_editable, ensure_invoiceable, voucher_total,
};
