// Adapters behind the application ports

pub mod http_client;
pub mod session_file;

pub use http_client::ReqwestHttp;
pub use session_file::SessionFile;
