//! Where per-angle frames come from. The rendering itself happens in an
//! external image-editing service; this module only knows how to ask it for
//! one frame at a time.

use std::{env, fmt};

use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use thiserror::Error;

use crate::angle::Degrees;

/// Environment variable holding the token for the rendering service.
pub static TOKEN_VARIABLE: &str = "GAZEATLAS_API_TOKEN";

const PUPIL_RANGE: f64 = 15.0;
const ROTATION_RANGE: f64 = 20.0;
const HEAD_TURN: f64 = 10.0;

/// Expression-editor inputs that make a face look toward an angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeParams {
    pub pupil_x: f64,
    pub pupil_y: f64,
    pub rotate_yaw: f64,
    pub rotate_pitch: f64,
}

impl GazeParams {
    /// Places the pupils on a circle of radius 15 at `angle` and turns the
    /// head up to 10° along with them.
    pub fn for_angle(angle: Degrees) -> Self {
        let radians = f64::from(angle).to_radians();
        let pupil_x = PUPIL_RANGE * radians.cos();
        let pupil_y = PUPIL_RANGE * radians.sin();

        Self {
            pupil_x: clamp(pupil_x, PUPIL_RANGE),
            pupil_y: clamp(pupil_y, PUPIL_RANGE),
            rotate_yaw: clamp(pupil_x / PUPIL_RANGE * HEAD_TURN, ROTATION_RANGE),
            rotate_pitch: clamp(-(pupil_y / PUPIL_RANGE) * HEAD_TURN, ROTATION_RANGE),
        }
    }
}

fn clamp(value: f64, range: f64) -> f64 {
    value.max(-range).min(range)
}

/// Renders one frame of a subject looking in some direction.
pub trait FrameSource {
    /// Returns encoded image bytes in any format the `image` crate can decode.
    fn render(&mut self, photo: &[u8], gaze: &GazeParams) -> Result<Vec<u8>, FrameSourceError>;
}

#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("{} isn't set; the frame generator needs it to authenticate", TOKEN_VARIABLE)]
    MissingToken,

    #[error("no frame generator endpoint is configured")]
    MissingEndpoint,

    #[error("frame generator responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("frame generator returned no output")]
    EmptyOutput,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    output: Vec<String>,
}

/// Talks to an HTTP expression-editor endpoint.
///
/// The photo and gaze parameters are posted as a multipart form. The endpoint
/// may answer with the image itself, or with JSON of the form
/// `{ "output": [url, ...] }`, in which case the first URL is downloaded.
pub struct HttpFrameSource {
    endpoint: String,
    token: String,
    client: Client,
}

impl fmt::Debug for HttpFrameSource {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "<HttpFrameSource {}>", self.endpoint)
    }
}

impl HttpFrameSource {
    pub fn new(endpoint: String, token: String) -> Self {
        Self {
            endpoint,
            token,
            client: Client::new(),
        }
    }

    pub fn from_env(endpoint: Option<String>) -> Result<Self, FrameSourceError> {
        let endpoint = endpoint.ok_or(FrameSourceError::MissingEndpoint)?;
        let token = env::var(TOKEN_VARIABLE).map_err(|_| FrameSourceError::MissingToken)?;

        Ok(Self::new(endpoint, token))
    }
}

impl FrameSource for HttpFrameSource {
    fn render(&mut self, photo: &[u8], gaze: &GazeParams) -> Result<Vec<u8>, FrameSourceError> {
        let form = Form::new()
            .part("image", Part::bytes(photo.to_vec()).file_name("photo.jpg"))
            .text("pupil_x", gaze.pupil_x.to_string())
            .text("pupil_y", gaze.pupil_y.to_string())
            .text("rotate_yaw", gaze.rotate_yaw.to_string())
            .text("rotate_pitch", gaze.rotate_pitch.to_string());

        let mut response = self
            .client
            .post(self.endpoint.as_str())
            .bearer_auth(&self.token)
            .multipart(form)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();

            log::error!("status: {}", status);
            log::error!("body: {}", body);

            return Err(FrameSourceError::Status { status, body });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        let mut contents = Vec::new();

        if is_json {
            let body: RenderResponse = response.json()?;
            let url = body
                .output
                .into_iter()
                .next()
                .ok_or(FrameSourceError::EmptyOutput)?;

            log::debug!("Downloading rendered frame from {}", url);

            let mut download = self.client.get(url.as_str()).send()?.error_for_status()?;
            download.copy_to(&mut contents)?;
        } else {
            response.copy_to(&mut contents)?;
        }

        if contents.is_empty() {
            return Err(FrameSourceError::EmptyOutput);
        }

        Ok(contents)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn gaze_right() {
        let gaze = GazeParams::for_angle(0);

        assert!(close(gaze.pupil_x, 15.0));
        assert!(close(gaze.pupil_y, 0.0));
        assert!(close(gaze.rotate_yaw, 10.0));
        assert!(close(gaze.rotate_pitch, 0.0));
    }

    #[test]
    fn gaze_quarter_turn() {
        let gaze = GazeParams::for_angle(90);

        assert!(close(gaze.pupil_x, 0.0));
        assert!(close(gaze.pupil_y, 15.0));
        assert!(close(gaze.rotate_yaw, 0.0));
        assert!(close(gaze.rotate_pitch, -10.0));
    }

    #[test]
    fn gaze_stays_in_range() {
        for angle in 0..360 {
            let gaze = GazeParams::for_angle(angle);

            assert!(gaze.pupil_x.abs() <= PUPIL_RANGE);
            assert!(gaze.pupil_y.abs() <= PUPIL_RANGE);
            assert!(gaze.rotate_yaw.abs() <= ROTATION_RANGE);
            assert!(gaze.rotate_pitch.abs() <= ROTATION_RANGE);
        }
    }

    #[test]
    fn missing_endpoint() {
        assert!(matches!(
            HttpFrameSource::from_env(None),
            Err(FrameSourceError::MissingEndpoint)
        ));
    }
}
