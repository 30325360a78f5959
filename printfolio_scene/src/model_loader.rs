//! Optional decorative model shown next to one printer. Loading happens on a
//! worker thread; the scene polls for the result once per frame and simply
//! carries on without the model if anything goes wrong.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::color::Rgb;
use crate::config::ModelOptions;
use crate::environment::GROUND_HEIGHT;
use crate::geometry::TriangleMesh;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("reading model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model {0} contains no triangles")]
    Empty(PathBuf),
    #[error("model {0} has zero extent")]
    Degenerate(PathBuf),
    #[error("model loader thread exited without a result")]
    WorkerGone,
}

/// A model already centered at its local origin, with the transform that
/// rests it on the ground at the configured spot.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub mesh: TriangleMesh,
    pub scale: f32,
    pub position: Vec3,
    pub color: Rgb,
}

pub fn load_stl_model(path: &Path, options: &ModelOptions) -> Result<LoadedModel, ModelLoadError> {
    let io_error = |source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_error)?;
    let stl = stl_io::read_stl(&mut file).map_err(io_error)?;

    let vertices: Vec<Vec3> = stl
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();
    let faces: Vec<[usize; 3]> = stl.faces.iter().map(|face| face.vertices).collect();
    if faces.is_empty() {
        return Err(ModelLoadError::Empty(path.to_path_buf()));
    }
    let mesh = TriangleMesh::from_triangles(&vertices, &faces);
    normalize_model(mesh, options).ok_or_else(|| ModelLoadError::Degenerate(path.to_path_buf()))
}

/// Centers `mesh`, scales its largest extent to `target_size`, and lifts it so
/// the lowest point touches the ground plane.
pub fn normalize_model(mut mesh: TriangleMesh, options: &ModelOptions) -> Option<LoadedModel> {
    let bounds = mesh.bounds()?;
    let size = bounds.size();
    let max_dim = size.x.max(size.y).max(size.z);
    if !(max_dim > f32::EPSILON) {
        return None;
    }
    mesh.transform(&Mat4::from_translation(-bounds.center()));

    let scale = options.target_size / max_dim;
    let bottom = -size.y / 2.0 * scale;
    let position = Vec3::new(
        options.position.x,
        GROUND_HEIGHT - bottom,
        options.position.z,
    );
    Some(LoadedModel {
        mesh,
        scale,
        position,
        color: options.color,
    })
}

/// A load running on a background thread.
pub struct PendingModel {
    receiver: Receiver<Result<LoadedModel, ModelLoadError>>,
}

impl PendingModel {
    pub fn spawn(path: PathBuf, options: ModelOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = load_stl_model(&path, &options);
            let _ = tx.send(result);
        });
        Self { receiver: rx }
    }

    /// `None` while the worker is still busy.
    pub fn poll(&self) -> Option<Result<LoadedModel, ModelLoadError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ModelLoadError::WorkerGone)),
        }
    }

    /// Blocks until the worker reports.
    pub fn wait(self) -> Result<LoadedModel, ModelLoadError> {
        self.receiver.recv().unwrap_or(Err(ModelLoadError::WorkerGone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_binary_stl(file: &mut impl Write, triangles: &[[[f32; 3]; 3]]) -> std::io::Result<()> {
        file.write_all(&[0u8; 80])?;
        file.write_all(&(triangles.len() as u32).to_le_bytes())?;
        for tri in triangles {
            for _ in 0..3 {
                file.write_all(&0f32.to_le_bytes())?;
            }
            for vertex in tri {
                for component in vertex {
                    file.write_all(&component.to_le_bytes())?;
                }
            }
            file.write_all(&0u16.to_le_bytes())?;
        }
        Ok(())
    }

    fn wedge() -> Vec<[[f32; 3]; 3]> {
        vec![
            [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            [[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]],
            [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [4.0, 0.0, 0.0]],
            [[4.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 2.0, 0.0]],
        ]
    }

    #[test]
    fn loads_and_rests_on_ground() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write_binary_stl(&mut file, &wedge())?;
        file.flush()?;

        let model = load_stl_model(file.path(), &ModelOptions::default())?;
        assert_eq!(model.mesh.triangle_count(), 4);
        assert!((model.scale - 1.5 / 4.0).abs() < 1e-6);

        let bounds = model.mesh.bounds().expect("bounds");
        assert!(bounds.center().length() < 1e-5);
        let lowest = model.position.y + bounds.min.y * model.scale;
        assert!((lowest - GROUND_HEIGHT).abs() < 1e-5);
        assert_eq!(model.position.x, 2.5);
        assert_eq!(model.color, Rgb::from_hex(0xffd54f));
        Ok(())
    }

    #[test]
    fn missing_file_reports_io_error() {
        let pending = PendingModel::spawn(
            PathBuf::from("/nonexistent/model.stl"),
            ModelOptions::default(),
        );
        match pending.wait() {
            Err(ModelLoadError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/model.stl"))
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn flat_model_is_rejected() {
        let points = [Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
        let mesh = TriangleMesh::from_triangles(&points, &[[0, 1, 2]]);
        assert!(normalize_model(mesh, &ModelOptions::default()).is_none());
    }
}
