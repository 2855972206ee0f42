//! Resource definitions

pub mod macros;
pub mod ticket;

pub use ticket::{Ticket, TicketWithMetadata, ticket_capabilities};
