//! Typed REST invocation core for cogsdk.
//!
//! Every service call follows the same shape: typed arguments are turned
//! into a [`RequestDescriptor`] by a [`RequestBuilder`], the [`RestClient`]
//! authorizes it with the service [`Credentials`] and hands it to a
//! [`Transport`], and the raw reply is mapped into a typed [`Response`] or
//! a structured [`Error`].

mod client;
mod credentials;
mod dispatch;
mod error;
pub mod mock;
mod request;
pub mod response;
mod transport;

pub use client::{
    ClientBuilder, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    LEARNING_OPT_OUT_HEADER, RestClient,
};
pub use credentials::{API_KEY_USERNAME, AuthMode, BearerToken, Credentials, mask_secret};
pub use dispatch::dispatch;
pub use error::{Error, Result};
pub use request::{Body, Method, Part, QueryParams, RequestBuilder, RequestDescriptor};
pub use response::{Response, TRANSACTION_ID_HEADER};
pub use transport::{HttpTransport, RawResponse, Transport};
