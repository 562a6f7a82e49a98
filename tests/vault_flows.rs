//! End-to-end receiver and sender flows over the public API.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use mockito::{Matcher, Server};
use parking_lot::Mutex;

use facelock_vault::{
    AttemptState, ClientConfig, DecryptedFile, FaceCapture, FaceSample, FileContent, FixedPicker,
    HttpVaultService, RenderInstruction, Screen, SecretBundle, SecretFile, VaultAccessTerminal,
    VaultCreationFlow, VaultError, VaultLocator, VaultResult, VerificationService,
};

struct StillCamera;

impl FaceCapture for StillCamera {
    fn capture(&mut self) -> Option<FaceSample> {
        FaceSample::new(b"jpeg-frame".to_vec(), "image/jpeg")
    }
}

/// Verification service answering from a script
struct ScriptedService {
    replies: Mutex<VecDeque<VaultResult<Vec<DecryptedFile>>>>,
    destroyed: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new(replies: Vec<VaultResult<Vec<DecryptedFile>>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            destroyed: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VerificationService for ScriptedService {
    async fn verify(&self, _sample: FaceSample, _locator: &VaultLocator) -> VaultResult<Vec<DecryptedFile>> {
        self.replies
            .lock()
            .pop_front()
            .expect("unexpected verification request")
    }

    async fn destroy(&self, locator: &VaultLocator) -> VaultResult<()> {
        self.destroyed.lock().push(locator.to_string());
        Ok(())
    }
}

fn mismatch() -> VaultResult<Vec<DecryptedFile>> {
    Err(VaultError::VerificationRejected("Face mismatch.".into()))
}

#[tokio::test]
async fn failed_failed_authenticated_resets_counter() {
    let service = ScriptedService::new(vec![
        mismatch(),
        mismatch(),
        Ok(vec![DecryptedFile::new(
            "message.txt",
            "text/plain",
            FileContent::Embedded(b"hello world".to_vec()),
        )]),
    ]);
    let terminal = VaultAccessTerminal::new(Arc::clone(&service), &ClientConfig::default());
    terminal
        .select_locator(&FixedPicker::new("/media/usb1"))
        .await
        .unwrap();

    let mut camera = StillCamera;
    for _ in 0..3 {
        terminal.unlock(&mut camera).await.unwrap();
    }

    assert_eq!(
        terminal.attempt_state(),
        AttemptState { failure_count: 0, destroyed: false }
    );
    match terminal.screen() {
        Screen::Authenticated { items } => {
            assert_eq!(
                items[0].result,
                Ok(RenderInstruction::Text { body: "hello world".into() })
            );
        }
        other => panic!("unexpected screen: {:?}", other),
    }
    assert!(service.destroyed.lock().is_empty());
}

#[tokio::test]
async fn three_rejections_over_http_destroy_the_vault() {
    let mut server = Server::new_async().await;

    let unlock = server
        .mock("POST", "/vault/unlock")
        .with_status(403)
        .with_body(r#"{"detail": "Face mismatch."}"#)
        .expect(3)
        .create_async()
        .await;
    let destroy = server
        .mock("POST", "/vault/destroy")
        .match_body(Matcher::Regex("/media/usb1".to_string()))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        endpoint: server.url(),
        ..Default::default()
    };
    let service = HttpVaultService::new(&config).unwrap();
    let terminal = VaultAccessTerminal::new(service, &config);
    terminal
        .select_locator(&FixedPicker::new("/media/usb1"))
        .await
        .unwrap();

    let mut camera = StillCamera;
    for _ in 0..3 {
        terminal.unlock(&mut camera).await.unwrap();
    }

    assert_eq!(
        terminal.attempt_state(),
        AttemptState { failure_count: 3, destroyed: true }
    );
    assert!(matches!(terminal.screen(), Screen::Destroyed { .. }));

    // The fourth attempt is refused locally
    assert!(matches!(
        terminal.unlock(&mut camera).await,
        Err(VaultError::VaultDestroyed)
    ));

    unlock.assert_async().await;
    destroy.assert_async().await;
}

#[tokio::test]
async fn sender_creates_vault_over_http() {
    let mut server = Server::new_async().await;

    let create = server
        .mock("POST", "/vault/create")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name=\"target_dir\"".to_string()),
            Matcher::Regex("/media/usb1".to_string()),
            Matcher::Regex("meet at dawn".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"success": true, "message": "Vault created at /media/usb1/SecureVault"}"#)
        .expect(1)
        .create_async()
        .await;

    let service = HttpVaultService::with_base_url(&server.url()).unwrap();
    let flow = VaultCreationFlow::new(service);

    let target = VaultLocator::pick(&FixedPicker::new("/media/usb1"))
        .await
        .unwrap()
        .unwrap();

    // Missing face is refused before anything is sent
    let refused = flow
        .create_vault(&SecretBundle::new().with_target(target.clone()).with_text("meet at dawn"))
        .await;
    assert!(!refused.success);
    assert_eq!(refused.message, "face image required");

    let bundle = SecretBundle::new()
        .with_reference_face(b"face".to_vec())
        .with_target(target)
        .with_text("meet at dawn")
        .with_file(SecretFile::new("notes.txt", b"bring the map".to_vec()));

    let outcome = flow.create_vault(&bundle).await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Vault created at /media/usb1/SecureVault");

    create.assert_async().await;
}
