pub mod agenda_html;
pub mod ics;

pub use agenda_html::{discover_calendar_links, extract_cards, next_page_link, AgendaCard};
pub use ics::{parse_ics, IcsEvent};
