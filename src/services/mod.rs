pub mod dispatch_service;
pub mod receipt_service;
