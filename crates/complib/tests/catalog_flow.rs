//! End-to-end catalog flows against the in-memory backend.

use complib::catalog::{
    Catalog, CatalogError, DisplayMode, ImageFile, NoticeLevel, RecordingClipboard, EMPTY_HINT,
    EMPTY_TITLE,
};
use complib::gateway::{BackendGateway, GatewayError, MemoryGateway, TimedGateway};
use std::sync::Arc;
use std::time::{Duration, Instant};

const EMAIL: &str = "user@example.com";
const MIB: usize = 1024 * 1024;

async fn sign_in_by_link(gateway: &Arc<MemoryGateway>, catalog: &mut Catalog) {
    catalog.sign_in_mut().email = EMAIL.into();
    let task = catalog.begin_request_sign_in().unwrap();
    catalog.run(task).await;
    gateway.confirm_link(EMAIL).unwrap();
    let task = catalog.begin_session_check();
    catalog.run(task).await;
}

async fn signed_in() -> (Arc<MemoryGateway>, Catalog) {
    let gateway = Arc::new(MemoryGateway::new());
    let mut catalog = Catalog::new(gateway.clone());
    sign_in_by_link(&gateway, &mut catalog).await;
    catalog.take_notices();
    (gateway, catalog)
}

fn fill_navbar(catalog: &mut Catalog) {
    let form = catalog.open_create_form().unwrap();
    form.name = "Navbar".into();
    form.code = "<nav>...</nav>".into();
    form.tags.add("navigation");
    form.tags.add("layout");
}

#[tokio::test]
async fn test_first_sign_in_shows_empty_catalog() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut catalog = Catalog::new(gateway.clone());

    let task = catalog.begin_session_check();
    catalog.run(task).await;
    assert!(!catalog.is_authenticated());

    sign_in_by_link(&gateway, &mut catalog).await;

    assert!(catalog.is_authenticated());
    assert_eq!(catalog.session().map(|s| s.email.as_str()), Some(EMAIL));
    assert!(catalog.visible().is_empty());
    assert_eq!(gateway.calls().authenticate, 1);
    assert_eq!(gateway.calls().list, 1);
    assert_eq!(EMPTY_TITLE, "No components found");
    assert_eq!(EMPTY_HINT, "Try adjusting your search or filter criteria");
}

#[tokio::test]
async fn test_create_with_two_mib_image() {
    let (gateway, mut catalog) = signed_in().await;
    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![0; 2 * MIB]))
        .unwrap();

    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;

    let calls = gateway.calls();
    assert_eq!((calls.upload, calls.insert, calls.list), (1, 1, 2));

    let visible = catalog.visible();
    assert_eq!(visible.len(), 1);
    let navbar = visible[0];
    assert_eq!(navbar.name, "Navbar");
    assert_eq!(navbar.tags, vec!["navigation", "layout"]);
    assert!(navbar.image_url.ends_with(".png"));
    assert_eq!(catalog.display_mode(&navbar.id), DisplayMode::Preview);

    let notices = catalog.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Navbar has been added to your library.");
}

#[tokio::test]
async fn test_six_mib_image_is_rejected_before_any_call() {
    let (gateway, mut catalog) = signed_in().await;
    fill_navbar(&mut catalog);

    let form = catalog.create_form_mut().unwrap();
    let err = form
        .select_image(ImageFile::new("huge.png", vec![0; 6 * MIB]))
        .unwrap_err();
    assert!(matches!(err, CatalogError::ImageTooLarge { .. }));
    assert_eq!(form.name, "Navbar");
    assert_eq!(form.code, "<nav>...</nav>");
    assert_eq!(form.tags.tags(), ["navigation", "layout"]);

    assert_eq!(catalog.begin_create().err(), Some(CatalogError::MissingImage));
    assert_eq!(gateway.calls().upload, 0);
    assert_eq!(gateway.calls().insert, 0);
}

#[tokio::test]
async fn test_copy_acknowledgment_lasts_two_seconds() {
    let (_gateway, mut catalog) = signed_in().await;
    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![1; 128]))
        .unwrap();
    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;

    let id = catalog.visible()[0].id.clone();
    let mut clipboard = RecordingClipboard::default();
    let t0 = Instant::now();
    catalog.copy_code(&id, &mut clipboard, t0).unwrap();

    assert_eq!(clipboard.last(), Some("<nav>...</nav>"));
    catalog.tick(t0 + Duration::from_millis(500));
    assert!(catalog.is_copy_acknowledged(&id, t0 + Duration::from_millis(500)));
    catalog.tick(t0 + Duration::from_secs(2));
    assert!(!catalog.is_copy_acknowledged(&id, t0 + Duration::from_secs(2)));
}

#[tokio::test]
async fn test_delete_gate_is_byte_exact() {
    let (gateway, mut catalog) = signed_in().await;
    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![1; 128]))
        .unwrap();
    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;
    let id = catalog.visible()[0].id.clone();

    for attempt in ["navbar", "Navbar ", " Navbar", "NAVBAR", ""] {
        catalog.open_delete(&id).unwrap().typed = attempt.into();
        assert!(
            matches!(catalog.begin_delete(), Err(CatalogError::ConfirmationMismatch { .. })),
            "{attempt:?} should not confirm"
        );
    }
    assert_eq!(gateway.calls().delete, 0);

    catalog.delete_confirm_mut().unwrap().typed = "Navbar".into();
    let task = catalog.begin_delete().unwrap();
    catalog.run(task).await;
    assert_eq!(gateway.calls().delete, 1);
    assert!(catalog.visible().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_backend_times_out_and_clears_busy() {
    let memory = Arc::new(MemoryGateway::new());
    let timed: Arc<dyn BackendGateway> =
        Arc::new(TimedGateway::new(memory.clone(), Duration::from_secs(15)));
    let mut catalog = Catalog::new(timed);
    sign_in_by_link(&memory, &mut catalog).await;
    catalog.take_notices();

    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![1; 128]))
        .unwrap();
    memory.set_hang(true);

    let task = catalog.begin_create().unwrap();
    assert!(catalog.create_form().unwrap().is_busy());
    catalog.run(task).await;

    let form = catalog.create_form().unwrap();
    assert!(!form.is_busy());
    assert_eq!(
        form.error(),
        Some(GatewayError::Timeout(Duration::from_secs(15)).to_string().as_str())
    );
    let notices = catalog.take_notices();
    assert_eq!(notices[0].title, "Failed to upload image");
}

#[tokio::test]
async fn test_sign_out_clears_list() {
    let (gateway, mut catalog) = signed_in().await;
    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![1; 128]))
        .unwrap();
    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;
    assert_eq!(catalog.components().len(), 1);

    let task = catalog.begin_sign_out();
    catalog.run(task).await;

    assert!(!catalog.is_authenticated());
    assert!(catalog.components().is_empty());
    assert!(catalog.visible().is_empty());
    assert_eq!(catalog.begin_reload().err(), Some(CatalogError::NotAuthenticated));
    assert_eq!(gateway.calls().sign_out, 1);
}

#[tokio::test]
async fn test_failed_insert_after_upload_keeps_form() {
    let (gateway, mut catalog) = signed_in().await;
    gateway.fail_next_insert(GatewayError::Validation("name violates constraint".into()));
    fill_navbar(&mut catalog);
    catalog
        .create_form_mut()
        .unwrap()
        .select_image(ImageFile::new("navbar.png", vec![1; 128]))
        .unwrap();

    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;

    let form = catalog.create_form().unwrap();
    assert!(!form.is_busy());
    assert_eq!(form.name, "Navbar");
    assert_eq!(form.tags.tags(), ["navigation", "layout"]);
    assert!(form.image().is_some());
    assert!(catalog.components().is_empty());
    // the uploaded image stays behind
    assert_eq!(gateway.object_count(), 1);

    // retry succeeds with the same fields
    let task = catalog.begin_create().unwrap();
    catalog.run(task).await;
    assert!(catalog.create_form().is_none());
    assert_eq!(catalog.components().len(), 1);
}

#[tokio::test]
async fn test_failed_load_reports_notice() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut catalog = Catalog::new(gateway.clone());
    gateway.fail_next_list(GatewayError::Network("offline".into()));
    sign_in_by_link(&gateway, &mut catalog).await;

    let notices = catalog.take_notices();
    let last = notices.last().unwrap();
    assert!(last.is_error());
    assert_eq!(last.message, "Failed to load components");
    assert!(catalog.components().is_empty());
}
