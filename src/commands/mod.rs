pub mod generate_secrets;
pub mod render_config;
pub mod tcpwait;

pub use generate_secrets::GenerateSecretsCommand;
pub use render_config::RenderConfigCommand;
pub use tcpwait::TcpWaitCommand;
