pub mod accounts;
pub mod catalog;
pub mod reviews;
pub mod unit_of_work;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use reviews::ReviewService;
pub use unit_of_work::{AppUnitOfWork, AppUnitOfWorkBuilder};
