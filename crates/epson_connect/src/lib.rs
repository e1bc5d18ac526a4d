//! Client SDK for the Epson Connect cloud printing and scanning API.
//!
//! ```no_run
//! use epson_connect::{Client, Config, PrintSettings};
//!
//! # async fn run() -> epson_connect::Result<()> {
//! let client = Client::new(Config::new())?;
//! client.initialize().await?;
//!
//! let printer = client.printer();
//! let job_id = printer.print("report.pdf", PrintSettings::default()).await?;
//! println!("submitted {job_id}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod printer;
pub mod scanner;

pub use auth::context::{AuthContext, SessionSnapshot};
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use printer::settings::{
    ColorMode, MediaSize, MediaType, PaperSource, PrintMode, PrintQuality, PrintSetting,
    PrintSettings, ResolvedPrintSetting, ResolvedPrintSettings, TwoSided,
};
pub use printer::{Operator, PrintJob, Printer};
pub use scanner::{Destination, DestinationType, Scanner};
