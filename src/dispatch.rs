//!
//! Request dispatch: the boundary between a transport and the filebox.
//!
//! The dispatcher is transport-agnostic. It takes an inbound URI path and an
//! opaque request value, asks the optional [`SessionProvider`] for the
//! caller's roles, runs the file operation and maps the outcome to a
//! [`Response`] that a transport can render.
//!
//! All work is blocking filesystem I/O. Async servers should call into the
//! dispatcher from a blocking-task pool.

use std::io::Read;

use crate::error::{FileboxError, SessionError};
use crate::file::FileReader;
use crate::filebox::Filebox;
use crate::roles::RoleSet;

pub const DEFAULT_MOUNT_PREFIX: &str = "/downloads/";

/// Resolves a request to the caller's role set.
pub trait SessionProvider<Req>: Send + Sync {
    /// Roles for the caller. An `Err` means the session could not be resolved
    /// and the caller is treated as unauthenticated.
    fn current_roles(&self, request: &Req) -> Result<RoleSet, SessionError>;

    /// Where to send a caller who needs to (re-)authenticate.
    fn login_url(&self, request: &Req) -> String;
}

/// What the transport should answer.
#[derive(Debug)]
pub enum Response {
    /// Stream `reader` as an attachment. `reader.len()` is the byte length.
    Stream {
        reader: FileReader,
        content_disposition: String,
        /// The request's own content type, echoed back.
        content_type: Option<String>,
    },
    /// Upload stored.
    Created { bytes: u64 },
    Redirect { location: String },
    NotFound,
    InternalError,
}

impl Response {
    /// HTTP status code for this response.
    pub fn status(&self) -> u16 {
        match self {
            Response::Stream { .. } => 200,
            Response::Created { .. } => 201,
            Response::Redirect { .. } => 302,
            Response::NotFound => 404,
            Response::InternalError => 500,
        }
    }
}

type ContentTypeFn<Req> = dyn Fn(&Req) -> Option<String> + Send + Sync;

/// Serves downloads and uploads from a [`Filebox`] under a mount prefix.
pub struct RequestDispatcher<Req> {
    filebox: Filebox,
    mount_prefix: String,
    auth: Option<Box<dyn SessionProvider<Req>>>,
    content_type: Option<Box<ContentTypeFn<Req>>>,
}

impl<Req> std::fmt::Debug for RequestDispatcher<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("filebox", &self.filebox)
            .field("mount_prefix", &self.mount_prefix)
            .field("auth", &self.auth.is_some())
            .field("content_type", &self.content_type.is_some())
            .finish()
    }
}

impl<Req> RequestDispatcher<Req> {
    /// Anonymous dispatcher mounted at [`DEFAULT_MOUNT_PREFIX`].
    pub fn new(filebox: Filebox) -> Self {
        RequestDispatcher {
            filebox,
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_owned(),
            auth: None,
            content_type: None,
        }
    }

    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    pub fn with_auth(mut self, provider: impl SessionProvider<Req> + 'static) -> Self {
        self.auth = Some(Box::new(provider));
        self
    }

    /// Reads the request's content type so downloads can echo it back.
    pub fn with_content_type<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&Req) -> Option<String> + Send + Sync + 'static,
    {
        self.content_type = Some(Box::new(accessor));
        self
    }

    pub fn filebox(&self) -> &Filebox {
        &self.filebox
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Roles for `request`: the provider's answer, or the anonymous set when
    /// no provider is configured.
    pub fn current_roles(&self, request: &Req) -> Result<RoleSet, FileboxError> {
        match &self.auth {
            None => Ok(RoleSet::anonymous()),
            Some(provider) => Ok(provider.current_roles(request)?),
        }
    }

    /// Logical path for `uri_path`, or `None` if it lies outside the mount.
    pub fn strip_mount<'p>(&self, uri_path: &'p str) -> Option<&'p str> {
        let prefix = self.mount_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Some(uri_path);
        }
        let rest = uri_path.strip_prefix(prefix)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    pub fn download(&self, uri_path: &str, request: &Req) -> Response {
        let Some(logical) = self.strip_mount(uri_path) else {
            return Response::NotFound;
        };
        let outcome = self
            .current_roles(request)
            .and_then(|roles| self.filebox.access_file(logical, roles)?.read());
        match outcome {
            Ok(reader) => Response::Stream {
                content_disposition: attachment(reader.file_name()),
                content_type: self.content_type.as_ref().and_then(|read| read(request)),
                reader,
            },
            Err(err) => self.failure(err, request),
        }
    }

    pub fn upload<R: Read + ?Sized>(
        &self,
        uri_path: &str,
        body: &mut R,
        request: &Req,
    ) -> Response {
        let Some(logical) = self.strip_mount(uri_path) else {
            return Response::NotFound;
        };
        let outcome = self
            .current_roles(request)
            .and_then(|roles| self.filebox.access_file(logical, roles)?.write(body));
        match outcome {
            Ok(bytes) => Response::Created { bytes },
            Err(err) => self.failure(err, request),
        }
    }

    /// Maps an error to a response. Denials are answered with a login
    /// redirect when a session provider exists and with 404 otherwise, so
    /// anonymous callers cannot tell a protected file from a missing one.
    fn failure(&self, err: FileboxError, request: &Req) -> Response {
        match (&err, &self.auth) {
            (
                FileboxError::PermissionDenied { .. } | FileboxError::Unauthenticated(_),
                Some(provider),
            ) => {
                tracing::debug!(error = %err, "redirecting to login");
                Response::Redirect { location: provider.login_url(request) }
            }
            (FileboxError::PermissionDenied { .. } | FileboxError::Unauthenticated(_), None)
            | (FileboxError::NotFoundOnDisk { .. } | FileboxError::InvalidPath { .. }, _) => {
                tracing::debug!(error = %err, "answering not found");
                Response::NotFound
            }
            (FileboxError::Io { .. } | FileboxError::Meta(_), _) => {
                tracing::error!(error = %err, "file operation failed");
                Response::InternalError
            }
        }
    }
}

/// `Content-Disposition` value with the name quoted.
fn attachment(file_name: &str) -> String {
    let mut value = String::from("attachment; filename=\"");
    for c in file_name.chars() {
        if c == '"' || c == '\\' {
            value.push('\\');
        }
        value.push(c);
    }
    value.push('"');
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Header(Option<&'static str>);

    struct HeaderAuth;

    impl SessionProvider<Header> for HeaderAuth {
        fn current_roles(&self, request: &Header) -> Result<RoleSet, SessionError> {
            match request.0 {
                Some("broken") => Err(SessionError::new("bad token")),
                Some(role) => Ok([role].into_iter().collect()),
                None => Ok(RoleSet::anonymous()),
            }
        }

        fn login_url(&self, _request: &Header) -> String {
            "/login".to_owned()
        }
    }

    #[test]
    fn test_strip_mount() {
        let d: RequestDispatcher<Header> = RequestDispatcher::new(Filebox::new("/data"));
        assert_eq!(d.strip_mount("/downloads/a/b.txt"), Some("/a/b.txt"));
        assert_eq!(d.strip_mount("/downloads"), Some(""));
        assert_eq!(d.strip_mount("/downloadsx/a"), None);
        assert_eq!(d.strip_mount("/other/a"), None);

        let root = d.with_mount_prefix("/");
        assert_eq!(root.strip_mount("/a.txt"), Some("/a.txt"));
    }

    #[test]
    fn test_roles_without_provider_are_anonymous() {
        let d: RequestDispatcher<Header> = RequestDispatcher::new(Filebox::new("/data"));
        assert!(d.current_roles(&Header(Some("admin"))).unwrap().is_empty());
    }

    #[test]
    fn test_session_failure_is_unauthenticated() {
        let d: RequestDispatcher<Header> =
            RequestDispatcher::new(Filebox::new("/data")).with_auth(HeaderAuth);
        let err = d.current_roles(&Header(Some("broken"))).unwrap_err();
        assert!(matches!(err, FileboxError::Unauthenticated(_)));
        match d.download("/downloads/a.txt", &Header(Some("broken"))) {
            Response::Redirect { location } => assert_eq!(location, "/login"),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_attachment_quotes_name() {
        assert_eq!(attachment("q1.csv"), r#"attachment; filename="q1.csv""#);
        assert_eq!(attachment(r#"a "b"; c.txt"#), r#"attachment; filename="a \"b\"; c.txt""#);
        assert_eq!(attachment(r"x\y"), r#"attachment; filename="x\\y""#);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Response::NotFound.status(), 404);
        assert_eq!(Response::Created { bytes: 1 }.status(), 201);
        assert_eq!(Response::Redirect { location: String::new() }.status(), 302);
        assert_eq!(Response::InternalError.status(), 500);
    }
}
