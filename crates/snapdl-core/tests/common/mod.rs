pub mod resolver_server;
