//! Report rendering and the artifacts written for each run.
//!
//! # Submodules
//!
//! - [`report`]: Builds the message and flat renderings from the topic groups
//! - [`text`]: Writes the flat rendering as `final_report.txt` and the message
//!   rendering (Telegram HTML) as `final_report.html`
//! - [`json`]: Writes the structured report as `final_report.json`
//! - [`telegraph`]: Publishes the flat rendering as a Telegraph page (the web view)
//! - [`links`]: Reads and writes the discovered-links file
//!
//! # Output Structure
//!
//! ```text
//! output_frontpage/
//! ├── final_report.txt    # Flat rendering
//! ├── final_report.html   # Message rendering wrapped in a minimal page
//! └── final_report.json   # Topics, member articles, coverage
//!
//! urls.txt                # Optional, grouped by outlet with `# name` headers
//! ```

pub mod json;
pub mod links;
pub mod report;
pub mod telegraph;
pub mod text;
