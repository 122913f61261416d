pub mod agenda_page;
pub mod base;
pub mod factory;
pub mod hal_api;
pub mod paged_json;
pub mod parsers;

pub use agenda_page::AgendaPageCrawler;
pub use factory::create_crawler;
pub use hal_api::HalApiCrawler;
pub use paged_json::PagedJsonCrawler;
