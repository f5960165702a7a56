mod accessory_line;
mod sale;
mod sale_payment;

pub use accessory_line::{AccessoryLineResponse, AttachAccessoryRequest, PricedAccessoryLine};
pub use sale::{
    CreateSaleRequest, PaymentStatus, Sale, SaleFinancials, SaleResponse, SaleStatus,
    UpdateSaleRequest,
};
pub use sale_payment::{PaymentMethod, PaymentResponse, RecordPaymentRequest, SalePayment};
