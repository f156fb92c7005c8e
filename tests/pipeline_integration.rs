use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coursera_downloader::app::App;
use coursera_downloader::auth::SessionCredentials;
use coursera_downloader::common::logger::Verbosity;
use coursera_downloader::common::urls::PlatformUrls;
use coursera_downloader::config::{AppConfig, CredentialSource};
use coursera_downloader::downloader::backend::TransferBackend;
use coursera_downloader::downloader::error::DownloadError;
use coursera_downloader::downloader::planner::{DEFAULT_STALE_AFTER, DownloadPlanner, PlanOptions};
use coursera_downloader::parser::SyllabusParser;

const SYLLABUS: &str = r#"<html><body>
<div class="course-item-list">
  <div class="course-item-list-header expanded"><h3><span class="icon"></span>&nbsp;Week 1: Introduction</h3></div>
  <ul class="course-item-list-section-list">
    <li class="viewed">
      <a class="lecture-link" href="/nlp/lecture/1">Course Overview (12 min)</a>
      <div class="course-lecture-item-resource">
        <a href="https://cdn.example.org/nlp/lecture/download.mp4?lecture_id=1">mp4</a>
        <a href="https://cdn.example.org/nlp/slides/overview.pdf">pdf</a>
      </div>
    </li>
  </ul>
  <div class="course-item-list-header"><h3><span class="icon"></span>&nbsp;Week 2: Language Models</h3></div>
  <ul class="course-item-list-section-list">
    <li>
      <a class="lecture-link" href="/nlp/lecture/2">N-grams (8:15)</a>
      <div class="course-lecture-item-resource">
        <a href="https://cdn.example.org/nlp/lecture/download.mp4?lecture_id=2">mp4</a>
        <a href="https://cdn.example.org/nlp/slides/ngrams.pdf">pdf</a>
      </div>
    </li>
  </ul>
</div>
</body></html>"#;

// 记录调用并把地址写入文件
#[derive(Default, Clone)]
struct RecordingBackend {
    calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn transfer(
        &self,
        url: &str,
        output: &Path,
        _credentials: &SessionCredentials,
    ) -> Result<(), DownloadError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), output.to_path_buf()));
        tokio::fs::write(output, url).await?;
        Ok(())
    }
}

fn create_test_config(root: &Path, urls: PlatformUrls, credentials: CredentialSource) -> AppConfig {
    AppConfig {
        class_names: vec!["nlp".to_string()],
        credentials,
        formats: vec!["pdf".to_string()],
        section_filter: None,
        lecture_filter: None,
        external_programs: Vec::new(),
        overwrite: false,
        skip_download: false,
        local_page: None,
        output_root: root.to_path_buf(),
        verbose_dirs: false,
        reverse: false,
        stale_after: DEFAULT_STALE_AFTER,
        verbosity: Verbosity::Quiet,
        urls,
    }
}

fn write_cookie_file(dir: &Path) -> PathBuf {
    let file = dir.join("cookies.txt");
    std::fs::write(
        &file,
        "# Netscape HTTP Cookie File\n\
         127.0.0.1\tFALSE\t/\tFALSE\t0\tcsrf_token\tcsrf-from-file\n\
         127.0.0.1\tFALSE\t/\tFALSE\t0\tsession\tsession-from-file\n",
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_pdf_allow_list_yields_two_tasks() {
    let course = SyllabusParser::new(false).parse(SYLLABUS).unwrap();
    assert_eq!(course.sections().len(), 2);
    assert_eq!(course.sections()[0].name, "Week_1-_Introduction");
    assert_eq!(course.sections()[1].lectures[0].name, "N-grams");

    let mut opts = PlanOptions::new("nlp", "/out");
    opts.formats = vec!["pdf".to_string()];
    let plan = DownloadPlanner::new(opts).plan(&course).await;

    let paths: Vec<_> = plan.tasks.iter().map(|t| t.output_path.clone()).collect();
    assert_eq!(
        paths,
        [
            PathBuf::from("/out/nlp/01_Week_1-_Introduction/01_Course_Overview.pdf"),
            PathBuf::from("/out/nlp/02_Week_2-_Language_Models/01_N-grams.pdf"),
        ]
    );
    assert!(plan.tasks.iter().all(|t| t.format == "pdf"));
}

#[tokio::test]
async fn test_full_run_with_cookie_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nlp/auth/auth_redirector"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=fresh; Path=/"),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nlp/lecture/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SYLLABUS))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cookies = write_cookie_file(dir.path());
    let out = dir.path().join("out");
    let config = create_test_config(
        &out,
        PlatformUrls::with_base(&server.uri()),
        CredentialSource::CookiesFile(cookies),
    );

    let backend = RecordingBackend::default();
    let app =
        App::with_backend(config, Box::new(backend.clone()), CancellationToken::new()).unwrap();
    let completed = app.run().await.unwrap();

    // 刚下载的文件不会让课程被判定为结束
    assert!(completed.is_empty());

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "https://cdn.example.org/nlp/slides/overview.pdf");
    assert!(out.join("nlp/01_Week_1-_Introduction/01_Course_Overview.pdf").is_file());

    // 第二次运行时文件已存在，不再下载
    let report = app.download_class("nlp").await.unwrap();
    assert_eq!(report.downloaded, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_offline_mode_creates_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("syllabus.html");
    std::fs::write(&page, SYLLABUS).unwrap();
    let out = dir.path().join("out");

    let mut config = create_test_config(
        &out,
        PlatformUrls::with_base("http://127.0.0.1:9"),
        CredentialSource::Password {
            username: "me@example.com".to_string(),
            password: "unused".to_string(),
        },
    );
    config.skip_download = true;
    config.local_page = Some(page);
    config.formats = vec!["all".to_string()];

    let backend = RecordingBackend::default();
    let app =
        App::with_backend(config, Box::new(backend.clone()), CancellationToken::new()).unwrap();
    let report = app.download_class("nlp").await.unwrap();

    assert_eq!(report.placeholders, 4);
    assert!(backend.calls().is_empty());
    let video = out.join("nlp/02_Week_2-_Language_Models/01_N-grams.mp4");
    assert_eq!(std::fs::metadata(video).unwrap().len(), 0);
}

#[tokio::test]
async fn test_old_files_mark_class_completed() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("syllabus.html");
    std::fs::write(&page, SYLLABUS).unwrap();
    let out = dir.path().join("out");

    let section = out.join("nlp/01_Week_1-_Introduction");
    std::fs::create_dir_all(&section).unwrap();
    let file = std::fs::File::create(section.join("01_Course_Overview.pdf")).unwrap();
    file.set_modified(std::time::SystemTime::now() - Duration::from_secs(90 * 24 * 60 * 60))
        .unwrap();

    let mut config = create_test_config(
        &out,
        PlatformUrls::with_base("http://127.0.0.1:9"),
        CredentialSource::Password {
            username: "me@example.com".to_string(),
            password: "unused".to_string(),
        },
    );
    config.skip_download = true;
    config.local_page = Some(page);
    config.section_filter = Some(regex::Regex::new("Introduction").unwrap());

    let app = App::with_backend(
        config,
        Box::new(RecordingBackend::default()),
        CancellationToken::new(),
    )
    .unwrap();
    let completed = app.run().await.unwrap();
    assert_eq!(completed, ["nlp"]);
}

#[tokio::test]
async fn test_missing_class_does_not_stop_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone/auth/auth_redirector"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nlp/auth/auth_redirector"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nlp/lecture/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SYLLABUS))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cookies = write_cookie_file(dir.path());
    let mut config = create_test_config(
        &dir.path().join("out"),
        PlatformUrls::with_base(&server.uri()),
        CredentialSource::CookiesFile(cookies),
    );
    config.class_names = vec!["gone".to_string(), "nlp".to_string()];

    let backend = RecordingBackend::default();
    let app =
        App::with_backend(config, Box::new(backend.clone()), CancellationToken::new()).unwrap();
    let completed = app.run().await.unwrap();

    assert!(completed.is_empty());
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_cancel_stops_remaining_classes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SYLLABUS))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cookies = write_cookie_file(dir.path());
    let mut config = create_test_config(
        &dir.path().join("out"),
        PlatformUrls::with_base(&server.uri()),
        CredentialSource::CookiesFile(cookies),
    );
    config.class_names = vec!["nlp".to_string(), "ml".to_string()];

    let cancel = CancellationToken::new();
    cancel.cancel();
    let backend = RecordingBackend::default();
    let app = App::with_backend(config, Box::new(backend.clone()), cancel).unwrap();

    let err = app.run().await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_interrupts_slow_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nlp/auth/auth_redirector"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cookies = write_cookie_file(dir.path());
    let config = create_test_config(
        &dir.path().join("out"),
        PlatformUrls::with_base(&server.uri()),
        CredentialSource::CookiesFile(cookies),
    );

    let cancel = CancellationToken::new();
    let app = App::with_backend(config, Box::new(RecordingBackend::default()), cancel.clone())
        .unwrap();

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });
    let started = std::time::Instant::now();
    let err = app.download_class("nlp").await.unwrap_err();
    trigger.await.unwrap();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
}
