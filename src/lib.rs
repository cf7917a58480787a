//! trapcheck library
//!
//! Turns snmptrapd traphandle notifications into Sensu Go check events and
//! posts them to the local Sensu agent events API.

pub mod config;
pub mod event;
pub mod hostname;
pub mod notification;
pub mod oid;
pub mod parser;
pub mod sensu_client;

pub use config::Config;
pub use event::{build_event, Event, EventError};
pub use hostname::validate_hostname;
pub use notification::{AddressInfo, Notification, Varbind};
pub use oid::{OidAliasSet, SNMP_TRAP_OID, SYS_UPTIME};
pub use parser::{parse_notification, ParseError};
pub use sensu_client::{ClientError, SensuClient};
