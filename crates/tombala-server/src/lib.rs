// Library root for the host process, exposed so the transport can be tested
// without a binary.

pub mod ws_server;
