use async_trait::async_trait;
use proind_client::api::{
    AuthReply, AuthToken, Comment, CommentId, Error, NewComment, NewSession, ProjectId, Server,
};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

const MAX_RETRIES: u32 = 3;

lazy_static::lazy_static! {
    static ref CLIENT: ClientWithMiddleware = ClientBuilder::new(reqwest::Client::new()).build();
    static ref RETRYING_CLIENT: ClientWithMiddleware = ClientBuilder::new(reqwest::Client::new())
        .with(RetryTransientMiddleware::new_with_policy(
            ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES),
        ))
        .build();
}

/// Mutations toggle server state, so only reads are safe to replay
fn is_retryable(method: &Method) -> bool {
    *method == Method::GET
}

fn client_for(method: &Method) -> &'static ClientWithMiddleware {
    if is_retryable(method) {
        &RETRYING_CLIENT
    } else {
        &CLIENT
    }
}

/// The comment REST API over HTTP
pub struct HttpServer {
    host: String,
}

impl HttpServer {
    pub fn new(host: &str) -> HttpServer {
        HttpServer {
            host: String::from(host.trim_end_matches('/')),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        client_for(&method).request(method, url)
    }
}

fn with_auth(req: RequestBuilder, token: &AuthToken) -> RequestBuilder {
    req.header(AUTHORIZATION, format!("Bearer {}", token.0))
}

fn with_json<T: serde::Serialize>(req: RequestBuilder, body: &T) -> Result<RequestBuilder, Error> {
    let body = serde_json::to_vec(body)
        .map_err(|e| Error::Unknown(format!("serializing request: {e}")))?;
    Ok(req.header(CONTENT_TYPE, "application/json").body(body))
}

/// Turns a non-success answer into the error the server meant to send
pub fn decode_error(status: StatusCode, body: &[u8]) -> Error {
    match Error::parse(body) {
        Ok(e) => e,
        Err(err) => {
            tracing::debug!(?status, ?err, "error body is not an api error");
            Error::Unknown(format!("server answered {status}"))
        }
    }
}

async fn run(req: RequestBuilder) -> Result<Vec<u8>, Error> {
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(decode_error(status, &body));
    }
    Ok(body.to_vec())
}

async fn fetch<R>(req: RequestBuilder) -> Result<R, Error>
where
    R: for<'de> serde::Deserialize<'de>,
{
    let body = run(req).await?;
    serde_json::from_slice(&body).map_err(|e| Error::Unknown(format!("parsing server answer: {e}")))
}

#[async_trait]
impl Server for HttpServer {
    async fn login(&self, session: NewSession) -> Result<AuthReply, Error> {
        fetch(with_json(self.request(Method::POST, "auth/login"), &session)?).await
    }

    async fn list_comments(&self, project: &ProjectId) -> Result<Vec<Comment>, Error> {
        let path = format!("projects/{}/comments", project.0);
        fetch(self.request(Method::GET, &path)).await
    }

    async fn create_comment(&self, token: &AuthToken, c: &NewComment) -> Result<Comment, Error> {
        let req = with_auth(self.request(Method::POST, "comments"), token);
        fetch(with_json(req, c)?).await
    }

    async fn like(&self, token: &AuthToken, id: &CommentId) -> Result<Comment, Error> {
        let path = format!("comments/{}/like", id.0);
        fetch(with_auth(self.request(Method::POST, &path), token)).await
    }

    async fn dislike(&self, token: &AuthToken, id: &CommentId) -> Result<Comment, Error> {
        let path = format!("comments/{}/dislike", id.0);
        fetch(with_auth(self.request(Method::POST, &path), token)).await
    }

    async fn delete(&self, token: &AuthToken, id: &CommentId) -> Result<(), Error> {
        let path = format!("comments/{}", id.0);
        run(with_auth(self.request(Method::DELETE, &path), token)).await?;
        Ok(())
    }
}
