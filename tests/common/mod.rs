// 本地模拟的分析服务，记录收到的请求并按预设应答
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::oneshot;

pub const SUCCESS_BODY: &str = r#"{
  "success": true,
  "analysis": {
    "elements": [
      {"type": "tree", "confidence": 0.87, "description": "a tall oak",
       "bbox": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}}
    ],
    "imageInfo": {"width": 120, "height": 80, "size": 2048},
    "processingTime": "0.4s"
  }
}"#;

pub enum Reply {
  Json(u16, String),
  // 先睡眠再应答，用于触发客户端超时
  Stall(Duration),
}

#[derive(Debug, Clone)]
pub struct Part {
  pub name: String,
  pub file_name: Option<String>,
  pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub method: String,
  pub path: String,
  pub accept: Option<String>,
  pub parts: Vec<Part>,
}

struct Shared {
  reply: Reply,
  requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FakeApi {
  pub base_url: String,
  shared: Arc<Shared>,
  shutdown: Option<oneshot::Sender<()>>,
}

impl FakeApi {
  pub fn start(reply: Reply) -> FakeApi {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let shared = Arc::new(Shared {
      reply,
      requests: Mutex::new(Vec::new()),
    });
    let app = {
      let shared = shared.clone();
      Router::new().fallback(move |request: Request| handle(shared.clone(), request))
    };

    let (shutdown, signal) = oneshot::channel::<()>();
    std::thread::spawn(move || {
      let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
      runtime.block_on(async move {
        let listener = tokio::net::TcpListener::from_std(listener).unwrap();
        axum::serve(listener, app)
          .with_graceful_shutdown(async {
            let _ = signal.await;
          })
          .await
          .unwrap();
      });
    });

    FakeApi {
      base_url: format!("http://{}", addr),
      shared,
      shutdown: Some(shutdown),
    }
  }

  pub fn ok(body: &str) -> FakeApi {
    Self::start(Reply::Json(200, body.to_string()))
  }

  pub fn requests(&self) -> Vec<RecordedRequest> {
    self.shared.requests.lock().unwrap().clone()
  }
}

impl Drop for FakeApi {
  fn drop(&mut self) {
    if let Some(shutdown) = self.shutdown.take() {
      let _ = shutdown.send(());
    }
  }
}

async fn handle(shared: Arc<Shared>, request: Request) -> Response {
  let method = request.method().to_string();
  let path = request.uri().path().to_string();
  let accept = request
    .headers()
    .get(header::ACCEPT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);

  let mut parts = Vec::new();
  if let Ok(mut multipart) = Multipart::from_request(request, &()).await {
    while let Ok(Some(field)) = multipart.next_field().await {
      let name = field.name().unwrap_or_default().to_string();
      let file_name = field.file_name().map(str::to_string);
      let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
      parts.push(Part {
        name,
        file_name,
        data,
      });
    }
  }

  shared.requests.lock().unwrap().push(RecordedRequest {
    method,
    path,
    accept,
    parts,
  });

  match &shared.reply {
    Reply::Json(code, body) => (
      StatusCode::from_u16(*code).unwrap(),
      [(header::CONTENT_TYPE, "application/json")],
      body.clone(),
    )
      .into_response(),
    Reply::Stall(delay) => {
      tokio::time::sleep(*delay).await;
      (StatusCode::OK, SUCCESS_BODY).into_response()
    }
  }
}

/// 一个绑定后立即释放的本地端口，连接会被拒绝
pub fn closed_port_url() -> String {
  let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}", addr)
}

pub fn write_png(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
  let path = dir.join(name);
  image::RgbImage::from_pixel(120, 80, image::Rgb([40, 90, 40]))
    .save(&path)
    .unwrap();
  path
}
