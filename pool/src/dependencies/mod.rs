mod flash_loan_receiver;
pub use flash_loan_receiver::FlashLoanReceiverClient;
