mod config;
mod export;
mod scan;
mod support;
