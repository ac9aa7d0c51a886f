use std::time::Duration;

use backend::{
    AnswerPersistence, BackendConfig, BackendError, HttpBackend, PredictionService,
    QuestionProvider, SubjectAttemptCounter, TestSessionLifecycle,
};
use practice_core::model::{
    AnswerSubmission, ChoiceLabel, ConfidenceLevel, Difficulty, PredictionRequest, QuestionId,
    SubTopicId, SubjectId, TestSessionId, TopicId,
};
use wiremock::matchers::{body_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = BackendConfig::default()
        .with_base_url(server.uri())
        .with_token("t0ken");
    HttpBackend::new(&config).unwrap()
}

fn submission(selected: Option<&str>, correct: bool) -> AnswerSubmission {
    AnswerSubmission {
        question_id: QuestionId::new(11),
        subject_id: SubjectId::new(1),
        topic_id: TopicId::new(4),
        sub_topic_id: SubTopicId::new(40),
        difficulty: Difficulty::new(3).unwrap(),
        selected: selected.map(|s| ChoiceLabel::new(s).unwrap()),
        is_correct: correct,
        elapsed_seconds: 9,
        test_session_id: Some(TestSessionId::new(5)),
    }
}

#[tokio::test]
async fn fetches_and_validates_question_batch() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        {
            "soru_id": 1, "ders_id": 1, "konu_id": 2, "altbaslik_id": 20, "zorluk": 1,
            "soru_metin": "First?",
            "secenekler": {"A": "a", "B": "b"},
            "dogru_cevap": "A",
            "dogru_cevap_aciklamasi": "Because."
        },
        {
            "soru_id": 2, "ders_id": 1, "konu_id": 3, "altbaslik_id": 30, "zorluk": 4,
            "soru_metin": "Second?",
            "secenekler": {"A": "a", "B": "b", "C": "c"},
            "dogru_cevap": "C"
        }
    ]);
    Mock::given(method("GET"))
        .and(path("/questions/batch"))
        .and(query_param("ders_id", "1"))
        .and(query_param("etiket", "tyt"))
        .and(header("authorization", "Bearer t0ken"))
        .and(headers("cache-control", vec!["no-cache", "no-store", "must-revalidate"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let batch = backend_for(&server)
        .get_batch(SubjectId::new(1), Some("tyt"))
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].explanation(), Some("Because."));
    assert_eq!(batch[1].correct_choice().as_str(), "C");
    assert_eq!(batch[1].difficulty().level(), 4);
}

#[tokio::test]
async fn bad_request_is_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions/batch"))
        .respond_with(ResponseTemplate::new(400).set_body_string("not enough questions"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .get_batch(SubjectId::new(1), None)
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::BadRequest("not enough questions".into()));
}

#[tokio::test]
async fn submit_sends_normalized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answers/submit"))
        .and(body_json(serde_json::json!({
            "soru_id": 11,
            "selected": null,
            "ders_id": 1,
            "konu_id": 4,
            "altbaslik_id": 40,
            "zorluk": 3,
            "is_correct": 0,
            "is_skipped": true,
            "elapsed_seconds": 9,
            "test_session_id": 5
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"message": "ok", "submission_id": 99})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .submit_answer(&submission(None, false))
        .await
        .unwrap();
    assert_eq!(ack.submission_id, Some(99));
}

#[tokio::test]
async fn expired_session_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answers/submit"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .submit_answer(&submission(Some("A"), true))
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Unauthorized);
}

#[tokio::test]
async fn server_failure_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answers/submit"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .submit_answer(&submission(Some("A"), true))
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Server { status: 503 });
}

#[tokio::test]
async fn prediction_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answers/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prediction_percentage": 72,
            "confidence_level": "medium",
            "motivational_message": {
                "title": "Strong", "message": "Keep going", "type": "strong", "emoji": "💪"
            }
        })))
        .mount(&server)
        .await;

    let request = PredictionRequest {
        subject_id: SubjectId::new(1),
        topic_id: TopicId::new(4),
        sub_topic_id: SubTopicId::new(40),
        difficulty: Difficulty::new(3).unwrap(),
        is_correct: true,
    };
    let result = backend_for(&server).predict(&request).await.unwrap();
    assert_eq!(result.percentage(), 72);
    assert_eq!(result.confidence, ConfidenceLevel::Medium);
    assert_eq!(result.motivation.icon, "💪");
}

#[tokio::test]
async fn garbage_prediction_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answers/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let request = PredictionRequest {
        subject_id: SubjectId::new(1),
        topic_id: TopicId::new(4),
        sub_topic_id: SubTopicId::new(40),
        difficulty: Difficulty::new(3).unwrap(),
        is_correct: false,
    };
    let err = backend_for(&server).predict(&request).await.unwrap_err();
    assert!(matches!(err, BackendError::Malformed(_)));
}

#[tokio::test]
async fn subject_counts_are_keyed_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/answers/total-questions-by-subject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "1": {"total_questions": 10, "ai_enabled": false},
            "2": {"total_questions": 31, "ai_enabled": true}
        })))
        .mount(&server)
        .await;

    let counts = backend_for(&server).attempt_counts().await.unwrap();
    assert_eq!(counts[&SubjectId::new(1)].total_questions, 10);
    assert!(counts[&SubjectId::new(2)].ai_enabled);
}

#[tokio::test]
async fn test_session_start_and_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/questions/start-test"))
        .and(query_param("ders_id", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"test_session_id": 12})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/questions/end-test"))
        .and(query_param("test_session_id", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total_questions": 3, "correct_answers": 2, "incorrect_answers": 1
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let id = backend.start_session(SubjectId::new(2), None).await.unwrap();
    assert_eq!(id, TestSessionId::new(12));
    let summary = backend.end_session(id).await.unwrap();
    assert_eq!(summary.correct_answers, 2);
    assert_eq!(summary.total_questions, 3);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/answers/total-questions-by-subject"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut config = BackendConfig::default().with_base_url(server.uri());
    config.request_timeout = Duration::from_millis(50);
    let err = HttpBackend::new(&config)
        .unwrap()
        .attempt_counts()
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Timeout);
}

#[tokio::test]
async fn unreachable_server_is_a_connectivity_failure() {
    let config = BackendConfig::default().with_base_url("http://127.0.0.1:9");
    let err = HttpBackend::new(&config)
        .unwrap()
        .attempt_counts()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), backend::FailureKind::Connectivity);
}
