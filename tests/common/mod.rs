//! A stand-in Solr server for CLI integration tests.
//!
//! Records every `/update` body and `/select` query string, and answers
//! `/select` with a canned JSON body.

#![allow(dead_code)]

use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct Recorded {
    updates: Vec<String>,
    selects: Vec<String>,
    select_body: String,
}

type Shared = Arc<Mutex<Recorded>>;

pub struct MockSolr {
    url: String,
    state: Shared,
}

impl MockSolr {
    /// Serve on an ephemeral port from a background runtime.
    pub fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Recorded {
            select_body: r#"{"response":{"numFound":0,"start":0,"docs":[]}}"#.to_string(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/solr/update", post(update))
            .route("/solr/select", get(select))
            .route("/solr/admin/ping", get(ping))
            .with_state(state.clone());

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self {
            url: format!("http://{}/solr", addr),
            state,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn respond_with(&self, body: &str) {
        self.state.lock().unwrap().select_body = body.to_string();
    }

    pub fn updates(&self) -> Vec<String> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn selects(&self) -> Vec<String> {
        self.state.lock().unwrap().selects.clone()
    }

    pub fn commits(&self) -> usize {
        self.updates().iter().filter(|u| *u == "<commit/>").count()
    }

    pub fn adds(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|u| u.starts_with("<add"))
            .collect()
    }
}

async fn update(State(state): State<Shared>, body: String) -> impl IntoResponse {
    state.lock().unwrap().updates.push(body);
    (
        [(header::CONTENT_TYPE, "application/xml")],
        r#"<response><lst name="responseHeader"><int name="status">0</int></lst></response>"#,
    )
}

async fn select(State(state): State<Shared>, RawQuery(query): RawQuery) -> impl IntoResponse {
    let mut recorded = state.lock().unwrap();
    recorded.selects.push(query.unwrap_or_default());
    (
        [(header::CONTENT_TYPE, "application/json")],
        recorded.select_body.clone(),
    )
}

async fn ping() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"OK"}"#,
    )
}

pub const FIXTURE: &str = r#"{
  "classes": {
    "Page": {
      "fields": {
        "Title": "Varchar",
        "Content": "HTMLText",
        "URLSegment": "Varchar",
        "LastEdited": "SS_Datetime"
      },
      "link": "/{URLSegment}/"
    },
    "Document": {
      "fields": { "Title": "Varchar", "Filename": "Varchar" },
      "file": { "path_field": "Filename" }
    }
  },
  "objects": {
    "Page": [
      {
        "ID": 1,
        "Title": "Home",
        "Content": "<p>Welcome home</p>",
        "URLSegment": "home",
        "LastEdited": "2024-03-01 10:00:00"
      },
      {
        "ID": 2,
        "Title": "About",
        "Content": "<p>About us</p>",
        "URLSegment": "about",
        "LastEdited": "2024-03-02 10:00:00"
      }
    ],
    "Document": [
      { "ID": 5, "Title": "Notes", "Filename": "notes.txt" }
    ]
  }
}"#;

/// A temp workspace with a config, an object store fixture, and one asset.
pub struct Workspace {
    pub dir: TempDir,
    pub config: PathBuf,
}

impl Workspace {
    pub fn new(server: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("config")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();

        fs::write(root.join("data").join("objects.json"), FIXTURE).unwrap();
        fs::write(
            root.join("assets").join("notes.txt"),
            "searchable note body\n",
        )
        .unwrap();

        let config = root.join("config").join("solr-bridge.toml");
        fs::write(&config, config_toml(root, server)).unwrap();

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_asset(&self, name: &str, bytes: &[u8]) {
        fs::write(self.root().join("assets").join(name), bytes).unwrap();
    }

    pub fn write_store(&self, json: &str) {
        fs::write(self.root().join("data").join("objects.json"), json).unwrap();
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.root().join("data").join("reindex-cursor.json")
    }

    /// Run the binary. Returns (stdout, stderr, success).
    pub fn run(&self, args: &[&str]) -> (String, String, bool) {
        let output = Command::new(bridge_binary())
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .output()
            .expect("failed to run solr-bridge");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    }
}

fn config_toml(root: &Path, server: &str) -> String {
    format!(
        r#"[solr]
server = "{server}"
timeout_secs = 5

[store]
path = "{root}/data/objects.json"
assets_root = "{root}/assets"

[reindex]
page_size = 50
cursor_path = "{root}/data/reindex-cursor.json"

[classes.Page]
fields = [
  {{ source = "Title", stored = true }},
  {{ source = "Content", content_filter = "strip_html" }},
]

[classes.Document]
fields = [
  {{ source = "Title", stored = true }},
]
"#,
        server = server,
        root = root.display()
    )
}

pub fn bridge_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_solr-bridge"))
}

/// A server address nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:9/solr";
