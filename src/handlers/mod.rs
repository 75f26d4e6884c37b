mod handlers;
mod websockets;

pub use handlers::Handle;
pub use websockets::WebSockets;
