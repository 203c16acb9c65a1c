pub mod budget_repository;
pub mod category_repository;
pub mod report_repository;
pub mod transaction_repository;
pub mod wallet_repository;

// Re-export all repositories for convenient access
pub use budget_repository::BudgetRepository;
pub use category_repository::CategoryRepository;
pub use report_repository::ReportRepository;
pub use transaction_repository::TransactionRepository;
pub use wallet_repository::WalletRepository;
