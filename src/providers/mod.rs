pub mod nessie;
pub mod openai;
pub mod util;

pub use nessie::NessieProvider;
pub use openai::OpenAiAdvisor;
