// Library surface shared by the binary and the headless/integration tests.
// Rendering and the CLI stay in the binary.
pub mod app_dirs;
pub mod clock;
pub mod controller;
pub mod export;
pub mod feedback;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod stats;
pub mod util;

pub use controller::SessionController;
pub use session::{classify, Phase, QuestionResult, Session, Status};
pub use settings::Settings;
