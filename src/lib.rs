//! Weft — streaming chat-document assembly.
//!
//! Consumes a chat endpoint's incremental response (newline-delimited JSON
//! or SSE `data:` records carrying typed content events) and assembles an
//! ordered, mixed-media document of prose, code blocks, execution results,
//! and images, rendered incrementally to sanitized HTML.
//!
//! # Quick Start
//!
//! ```no_run
//! use weft::prelude::*;
//!
//! # async fn example() -> weft::error::Result<()> {
//! let transport = HttpTransport::new("https://example.com/api/chat/stream/", None);
//! let mut session = ChatSession::new(
//!     Box::new(transport),
//!     RenderPipeline::default(),
//!     Box::new(NullSink),
//! );
//! let document = session
//!     .run(ChatRequest::History(vec![ChatMessage::user("Hello!")]))
//!     .await?;
//! println!("{}", document.html);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod prelude;
pub mod render;
pub mod session;
pub mod transport;
pub mod types;
pub mod util;
