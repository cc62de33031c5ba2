//! # ユースケース層
//!
//! 通知 1 件の配信と、バッチ単位の処理を実装する。

mod batch;
mod dispatcher;
mod template_renderer;

pub use batch::{BatchHandler, BatchResult};
pub use dispatcher::Dispatcher;
pub use template_renderer::{MessageSettings, RenderError, TemplateRenderer};
