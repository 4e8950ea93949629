//! End-to-end import flow against a fake FMOD Studio console.

use fmod_importer::commands::ScriptTemplates;
use fmod_importer::{Importer, ImporterState, Settings};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const PROJECT_REPLY: &[u8] = b"out(): 'C:/proj/MyGame.fspro'\n";

/// Accepts one connection, answers the project-path query, then records
/// everything else the client sends until it disconnects.
async fn spawn_fake_console(reply: &'static [u8]) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut handshake = [0u8; 3];
        socket.read_exact(&mut handshake).await.unwrap();
        assert_eq!(handshake, [255, 253, 3]);

        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        let query = b"studio.project.filePath\n";
        while !received
            .windows(query.len())
            .any(|w| w == query.as_slice())
        {
            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
        }
        socket.write_all(reply).await.unwrap();

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&received).into_owned()
    });

    (addr, handle)
}

fn test_templates() -> ScriptTemplates {
    ScriptTemplates::from_parts(
        "var folderCache = {};",
        "createEvent('{EVENT_NAME}', '{RELATIVE_FOLDER_PATH}', '{FILE_PATHS_JSON}', '{INSTRUMENT_TYPE}');",
    )
}

fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut statuses = Vec::new();
    while let Ok(status) = rx.try_recv() {
        statuses.push(status);
    }
    statuses
}

#[tokio::test]
async fn full_import_sends_assets_before_group_scripts() {
    let (addr, server) = spawn_fake_console(PROJECT_REPLY).await;

    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("footsteps");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("step_1_m.wav"), b"x").unwrap();
    std::fs::write(sub.join("step_2_m.wav"), b"x").unwrap();
    std::fs::write(dir.path().join("wind.ogg"), b"x").unwrap();

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), Some(test_templates()));
    importer.connect("127.0.0.1", addr.port()).await.unwrap();
    assert_eq!(importer.project_path(), Some("C:/proj/MyGame.fspro"));

    importer.import_folder(dir.path()).await.unwrap();
    assert!(matches!(importer.state(), ImporterState::Connected { .. }));
    importer.disconnect();
    drop(importer);

    let wire = server.await.unwrap();

    // Global setup arrives before any import command.
    let setup_at = wire.find("var folderCache = {};").unwrap();
    let first_asset = wire.find("studio.project.importAudioFile").unwrap();
    assert!(setup_at < first_asset);

    // All three assets are imported, and every asset import precedes the
    // first group script.
    assert_eq!(wire.matches("studio.project.importAudioFile").count(), 3);
    let first_script = wire.find("createEvent(").unwrap();
    let last_asset = wire.rfind("studio.project.importAudioFile").unwrap();
    assert!(last_asset < first_script);

    // Suffix stripping and folder mapping made it onto the wire.
    assert!(wire.contains("createEvent('step_1', 'footsteps'"));
    assert!(wire.contains("createEvent('step_2', 'footsteps'"));
    assert!(wire.contains("createEvent('wind', ''"));
    assert!(wire.contains("Multi"));

    // Each group script carries the save trailer and completion marker.
    assert_eq!(wire.matches("studio.project.save();").count(), 3);
    assert!(wire.contains("[IMPORTER_LOG] Project saved after processing group"));

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "Connected (Project: MyGame)"));
    assert!(statuses.iter().any(|s| s == "Import process finished."));
}

#[tokio::test]
async fn empty_folder_reports_and_sends_nothing() {
    let (addr, server) = spawn_fake_console(PROJECT_REPLY).await;
    let dir = tempfile::tempdir().unwrap();

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), Some(test_templates()));
    importer.connect("127.0.0.1", addr.port()).await.unwrap();
    importer.import_folder(dir.path()).await.unwrap();
    importer.disconnect();
    drop(importer);

    let wire = server.await.unwrap();
    assert!(!wire.contains("studio.project.importAudioFile"));
    assert!(!wire.contains("createEvent("));

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "No audio files found."));
    assert!(statuses.iter().any(|s| s == "Import process finished."));
}

#[tokio::test]
async fn unparseable_project_reply_degrades_to_no_project() {
    let (addr, server) = spawn_fake_console(b"no marker here\n").await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hit.wav"), b"x").unwrap();

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), Some(test_templates()));
    importer.connect("127.0.0.1", addr.port()).await.unwrap();
    assert_eq!(importer.project_path(), None);

    // The flow continues without project identity.
    importer.import_folder(dir.path()).await.unwrap();
    importer.disconnect();
    drop(importer);

    let wire = server.await.unwrap();
    assert!(wire.contains("studio.project.importAudioFile"));

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "Connected (No project info)"));
    assert!(statuses
        .iter()
        .any(|s| s == "Warning: Unknown project path. Import may fail."));
}

#[tokio::test]
async fn import_without_templates_is_rejected_before_any_network_io() {
    let (addr, server) = spawn_fake_console(PROJECT_REPLY).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hit.wav"), b"x").unwrap();

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), None);
    importer.connect("127.0.0.1", addr.port()).await.unwrap();

    assert!(importer.import_folder(dir.path()).await.is_err());
    importer.disconnect();
    drop(importer);

    let wire = server.await.unwrap();
    assert!(!wire.contains("studio.project.importAudioFile"));

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "Error: Global script missing."));
    assert!(statuses.iter().any(|s| s == "Error: scripts not loaded."));
}

#[tokio::test]
async fn reconnect_supersedes_previous_connection() {
    let (first_addr, first_server) = spawn_fake_console(PROJECT_REPLY).await;
    let (second_addr, _second_server) = spawn_fake_console(PROJECT_REPLY).await;

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), Some(test_templates()));
    importer.connect("127.0.0.1", first_addr.port()).await.unwrap();
    importer.connect("127.0.0.1", second_addr.port()).await.unwrap();
    assert!(importer.is_connected());

    // The first server saw its client disappear.
    let _ = first_server.await.unwrap();

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "Connection disposed"));
    importer.disconnect();
}

#[tokio::test]
async fn import_into_missing_folder_is_rejected() {
    let (addr, _server) = spawn_fake_console(PROJECT_REPLY).await;

    let (mut importer, mut rx) = Importer::with_templates(Settings::default(), Some(test_templates()));
    importer.connect("127.0.0.1", addr.port()).await.unwrap();

    let missing = std::path::Path::new("/definitely/not/here");
    assert!(importer.import_folder(missing).await.is_err());
    assert!(matches!(importer.state(), ImporterState::Connected { .. }));

    let statuses = drain(&mut rx);
    assert!(statuses.iter().any(|s| s == "Error: Invalid folder"));
    importer.disconnect();
}
