//! Acoustic quality assessment via a remote scoring service.

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{check_status, AudioResource, GatewayError, MediaGateway, Result};

#[derive(Debug, Deserialize)]
struct AssessResponse {
    score: f64,
}

/// Round a score to 4 decimal places, half-way cases judged on the exact binary value.
///
/// `3.14165` is stored as `3.14164999...`, so it rounds down to `3.1416`.
pub fn round_score(score: f64) -> anyhow::Result<f64> {
    format!("{score:.4}")
        .parse::<f64>()
        .with_context(|| format!("Failed to round score {score}"))
}

impl MediaGateway {
    /// Score perceived audio quality. The range is defined by the scoring model.
    pub async fn assess_quality(&self, audio: &AudioResource) -> Result<f64> {
        self.assess(audio)
            .await
            .map_err(|e| GatewayError::QualityAssessment(format!("{e:#}")))
    }

    async fn assess(&self, audio: &AudioResource) -> anyhow::Result<f64> {
        let url = self.config.assessment_url();
        debug!(url, file = audio.filename, bytes = audio.data.len(), "Sending audio for assessment");

        let part = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name(audio.filename.clone());
        let form = reqwest::multipart::Form::new().part("audio", part);

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach assessment service")?;
        let resp = check_status(resp, "Assessment").await?;

        let body: AssessResponse = resp
            .json()
            .await
            .context("Failed to parse assessment response")?;
        let score = round_score(body.score)?;

        info!(file = audio.filename, score, "Audio quality assessed");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::test_support::gateway_for;

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(3.14159).unwrap(), 3.1416);
        assert_eq!(round_score(4.0).unwrap(), 4.0);
        assert_eq!(round_score(1.23444).unwrap(), 1.2344);
    }

    #[test]
    fn test_round_score_half_way_literals_round_down() {
        assert_eq!(round_score(3.14165).unwrap(), 3.1416);
        assert_eq!(round_score(2.50005).unwrap(), 2.5);
        assert_eq!(round_score(1.00105).unwrap(), 1.001);
    }

    #[tokio::test]
    async fn test_assess_rounds_score() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assess")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="audio""#.into()),
                Matcher::Regex(r#"filename="take1.wav""#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"score": 3.14159}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for(&server.url(), dir.path());
        let audio = AudioResource::new("take1.wav", b"RIFF....WAVE".to_vec());

        let score = gateway.assess_quality(&audio).await.unwrap();

        mock.assert_async().await;
        assert_eq!(score, 3.1416);
    }

    #[tokio::test]
    async fn test_assess_half_way_score_rounds_down() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assess")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"score": 3.14165}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for(&server.url(), dir.path());

        let score = gateway
            .assess_quality(&AudioResource::new("take2.wav", b"XYZ".to_vec()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(score, 3.1416);
    }

    #[tokio::test]
    async fn test_assessment_sends_no_provider_credential() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assess")
            .match_header("Authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"score": 2.5}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for(&server.url(), dir.path());

        let score = gateway
            .assess_quality(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(score, 2.5);
    }

    #[tokio::test]
    async fn test_missing_score_is_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assess")
            .with_status(200)
            .with_body(r#"{"mos": 3.0}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for(&server.url(), dir.path());

        let err = gateway
            .assess_quality(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, GatewayError::QualityAssessment(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assess")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway_for(&server.url(), dir.path());

        let err = gateway
            .assess_quality(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, GatewayError::QualityAssessment(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_error() {
        let dir = tempfile::tempdir().unwrap();
        // Port 9 (discard) is not expected to serve HTTP.
        let gateway = gateway_for("http://127.0.0.1:9", dir.path());

        let err = gateway
            .assess_quality(&AudioResource::new("a.wav", b"XYZ".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::QualityAssessment(ref msg) if msg.contains("reach")));
    }
}
