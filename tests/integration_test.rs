use invoice_checker::browser::ChromiumLauncher;
use invoice_checker::models::load_input_rows;
use invoice_checker::services::ResultWriter;
use invoice_checker::utils::logging;
use invoice_checker::{
    App, BrowserLauncher, BrowserSession, Config, InputRow, RowCtx, RowProcessor, TokioSleeper,
};
use std::sync::Arc;

#[test]
fn test_loader_and_writer_resume_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(
        &input,
        "filehash,assetlink\nh1,https://a/1\nh2,https://a/2\nh3,https://a/3\n",
    )
    .unwrap();

    // 前两行已在上次运行中处理
    let rows = load_input_rows(&input, 2).unwrap();
    assert_eq!(
        rows,
        vec![Ok(InputRow {
            filehash: "h3".into(),
            assetlink: "https://a/3".into()
        })]
    );

    let output = dir.path().join("output.csv");
    std::fs::write(&output, "filehash,filename,status\nh1,a.pdf,Invoice Present\n").unwrap();

    let mut writer = ResultWriter::open(&output).unwrap();
    writer
        .write(&invoice_checker::ResultRow::failed(
            "h3",
            "",
            &invoice_checker::RowError::DownloadTimeout,
        ))
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "filehash,filename,status\nh1,a.pdf,Invoice Present\nh3,,Download Timeout\n"
    );
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机安装 Chromium：cargo test -- --ignored
async fn test_browser_launch_and_close() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        download_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let row_dir = config.row_download_dir("smoke");
    std::fs::create_dir_all(&row_dir).unwrap();

    let launcher = ChromiumLauncher::new(&config);
    let mut session = launcher.launch(&row_dir).await.expect("启动浏览器失败");
    session
        .goto("data:text/html,<p>no links here</p>")
        .await
        .expect("导航失败");
    assert!(!session.click_first_anchor().await);
    session.close().await;
}

#[tokio::test]
#[ignore]
async fn test_single_row_against_real_link() {
    // 需要设置 INVOICE_TEST_LINK 为一个真实的下载页
    let Ok(link) = std::env::var("INVOICE_TEST_LINK") else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        download_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let _ = logging::init(&dir.path().join("debug.log"));

    let processor = RowProcessor::new(
        &config,
        Arc::new(ChromiumLauncher::new(&config)),
        Arc::new(TokioSleeper),
    );
    let row = InputRow {
        filehash: "manual".into(),
        assetlink: link,
    };
    let result = processor.run(&row, &RowCtx::new(1, 1, 1)).await;
    println!("{:?}", result);
    assert_eq!(result.filehash, "manual");
}

#[tokio::test]
#[ignore]
async fn test_full_run_from_env() {
    let config = Config::from_env();
    let _ = logging::init(&config.debug_log_file);

    let stats = App::initialize(config)
        .await
        .expect("初始化失败")
        .run()
        .await
        .expect("运行失败");
    println!("{:?}", stats);
}
