mod common;

use lexdraft_core::rag::{RagSystem, MANIFEST_FILE};
use tempfile::tempdir;

#[tokio::test]
async fn test_full_pipeline() {
    let temp = tempdir().unwrap();
    let service = common::service(&temp).await;

    // 1. Retrieval is ready and finds the wage provisions
    let health = service.health();
    assert!(health.rag_system_ready);
    assert!(health.letter_generator_ready);
    assert!(temp.path().join("vector_store").join(MANIFEST_FILE).exists());

    let hits = service
        .search("wages withheld delayed payment", None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.chunk.source.ends_with("wages_act.txt")));
    assert!(hits
        .iter()
        .any(|h| h.chunk.section_title.starts_with("Section 15")));

    // 2. Generate and persist a case
    let response = service.generate_letter(common::case()).await.unwrap();
    assert!(response.success);
    let case_id = response.case_id.clone().unwrap();
    let letter = response.letter.unwrap();
    assert_eq!(letter.supporting_sections.len(), 2);
    assert!(letter.formal_letter.starts_with("STATEMENT OF FACTS:"));
    assert!(letter.legal_arguments.starts_with("KEY ARGUMENTS:"));

    // 3. Read it back
    let stored = service.get_case(&case_id).await.unwrap();
    assert_eq!(stored.input, common::case());
    assert_eq!(stored.content.supporting_sections, letter.supporting_sections);
    assert_eq!(stored.content.relevant_documents.len(), 3);

    let second = service.generate_letter(common::case()).await.unwrap();
    let listed = service.list_cases().await.unwrap();
    assert_eq!(listed.cases.len(), 2);
    assert_eq!(Some(listed.cases[0].id.clone()), second.case_id);

    // 4. Export renders both documents
    let bundle = service.export_case(&case_id).await.unwrap();
    assert!(bundle.formal_content.contains("<h1>Iyer Legal</h1>"));
    assert!(bundle
        .formal_content
        .contains(r#"<div class="section-header">STATEMENT OF FACTS:</div>"#));
    assert!(bundle
        .formal_content
        .contains("<strong>1. </strong>Pay the <strong>withheld wages</strong>"));
    assert!(bundle.arguments.contains("<em>Section 5</em>"));
    assert!(bundle.arguments.contains("Case Tags:</strong> Unpaid Salary"));

    // 5. Delete
    service.delete_case(&case_id).await.unwrap();
    assert_eq!(
        service.get_case(&case_id).await.unwrap_err().status_code(),
        404
    );
    assert_eq!(service.list_cases().await.unwrap().cases.len(), 1);
}

#[tokio::test]
async fn saved_store_is_reused_until_documents_change() {
    let temp = tempdir().unwrap();
    let cfg = common::config(&temp);

    let (_, first) = RagSystem::bootstrap(cfg.clone(), common::registry(), false)
        .await
        .unwrap();
    let first = first.expect("first run ingests");
    assert_eq!(first.documents, 1);
    assert_eq!(first.pages, 3);
    assert_eq!(first.sections, 4);

    let (reused, summary) = RagSystem::bootstrap(cfg.clone(), common::registry(), false)
        .await
        .unwrap();
    assert!(summary.is_none());
    assert!(reused.is_indexed());

    std::fs::write(
        temp.path().join("documents").join("wages_act.txt"),
        format!("{}Section 20. Penalty\nFine for late payment.\n", common::STATUTE),
    )
    .unwrap();
    let (rebuilt, summary) = RagSystem::bootstrap(cfg, common::registry(), false)
        .await
        .unwrap();
    assert_eq!(summary.map(|s| s.sections), Some(5));
    assert!(rebuilt
        .documents()
        .iter()
        .any(|c| c.section_title == "Section 20. Penalty"));
}

#[tokio::test]
async fn missing_documents_leave_service_storage_only() {
    let temp = tempdir().unwrap();
    let mut cfg = common::config(&temp);
    cfg.documents.paths = vec![temp
        .path()
        .join("nowhere")
        .to_string_lossy()
        .into_owned()];

    let service = lexdraft_core::LetterService::start(cfg).await.unwrap();
    let health = service.health();
    assert!(!health.rag_system_ready);
    assert!(!health.letter_generator_ready);
    assert_eq!(
        service
            .generate_letter(common::case())
            .await
            .unwrap_err()
            .status_code(),
        503
    );
    assert!(service.list_cases().await.unwrap().cases.is_empty());
}
