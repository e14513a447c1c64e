use std::fmt;

#[derive(Debug)]
pub enum CameraError {
    InitializationFailed(String),
    OpenFailed(usize),
    CaptureFailed(String),
    #[cfg(feature = "opencv")]
    OpenCvError(opencv::Error),
    NotFrame,
    CameraOff,
    InvalidDeviceId(usize),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => {
                write!(f, "Camera initialization failed: {msg}")
            }
            Self::OpenFailed(id) => {
                write!(f, "Failed to open camera with device_id: {id}")
            }
            Self::CaptureFailed(msg) => write!(f, "Failed to capture frame: {msg}"),
            #[cfg(feature = "opencv")]
            Self::OpenCvError(e) => write!(f, "OpenCV error: {e}"),
            Self::NotFrame => write!(f, "No valid frame available"),
            Self::CameraOff => write!(f, "Camera not initialized"),
            Self::InvalidDeviceId(id) => write!(f, "Invalid Device ID: {id}"),
        }
    }
}

impl std::error::Error for CameraError {}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for CameraError {
    fn from(err: opencv::Error) -> Self {
        Self::OpenCvError(err)
    }
}
