#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bend;
pub mod geom;
pub mod path;

use std::fmt;
use std::rc::Rc;

use bend::{BendDiagnostics, BindingError, MeshBender, MeshError, SourceMesh};
use geom::{Point3, Quat, Vec3};
use path::{CubicCurve, CurveError, SampleProvider, Spline, SplineNode};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // A second initialisation keeps the logger that is already installed.
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Errors of the engine surface. Library errors are passed through unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("er is geen bronmesh geladen")]
    NoSource,
    #[error("er zijn geen splinenodes ingesteld")]
    NoSpline,
    #[error("er is geen curve of pad gekoppeld")]
    NotBound,
    #[error("mesh is nog niet gebogen")]
    NotEvaluated,
    #[error("{name} moet een veelvoud van 3 waarden bevatten, kreeg {len}")]
    FlatArrayLength { name: &'static str, len: usize },
    #[error("curve-index {index} bestaat niet (spline heeft {count} curves)")]
    CurveIndex { index: usize, count: usize },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Bent mesh as handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshExport {
    pub vertices: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub triangles: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundsExport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundsExport {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EngineBinding {
    Curve(usize),
    Path { start: f64, end: f64 },
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct BendEngine {
    bender: MeshBender,
    spline: Option<Rc<Spline>>,
    curve: Option<Rc<CubicCurve>>,
    binding: Option<EngineBinding>,
}

#[wasm_bindgen]
impl BendEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BendEngine {
        BendEngine {
            bender: MeshBender::new(),
            spline: None,
            curve: None,
            binding: None,
        }
    }

    /// Laad een bronmesh uit platte xyz-arrays. Lege normals worden nulvectoren.
    #[wasm_bindgen]
    pub fn load_source(
        &mut self,
        positions: Vec<f64>,
        normals: Vec<f64>,
        triangles: Vec<u32>,
    ) -> Result<(), JsValue> {
        self.try_load_source(&positions, &normals, triangles)
            .map_err(to_js_error)
    }

    /// Vervang de splinenodes (array van `SplineNode`-objecten).
    #[wasm_bindgen]
    pub fn set_nodes(&mut self, nodes: JsValue) -> Result<(), JsValue> {
        let nodes: Vec<SplineNode> = serde_wasm_bindgen::from_value(nodes)
            .map_err(|err| JsValue::from(JsError::new(&err.to_string())))?;
        self.try_set_nodes(nodes).map_err(to_js_error)
    }

    /// Sluit of open de spline.
    #[wasm_bindgen]
    pub fn set_loop(&mut self, is_loop: bool) -> Result<(), JsValue> {
        self.try_set_loop(is_loop).map_err(to_js_error)
    }

    /// Buig langs één curve van de spline.
    #[wasm_bindgen]
    pub fn bind_curve(&mut self, index: usize) -> Result<(), JsValue> {
        self.try_bind_curve(index).map_err(to_js_error)
    }

    /// Buig langs een deel van de spline, vanaf `start`.
    #[wasm_bindgen]
    pub fn bind_path(&mut self, start: f64, end: f64) -> Result<(), JsValue> {
        self.try_bind_path(start, end).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_translation(&mut self, x: f64, y: f64, z: f64) {
        self.bender.set_translation(Vec3::new(x, y, z));
    }

    /// Rotatie in graden.
    #[wasm_bindgen]
    pub fn set_rotation_euler(&mut self, x: f64, y: f64, z: f64) {
        self.bender.set_rotation(Quat::from_euler_degrees(x, y, z));
    }

    /// De x-schaal wordt begrensd tot [-1, 1].
    #[wasm_bindgen]
    pub fn set_scale(&mut self, x: f64, y: f64, z: f64) {
        self.bender.set_scale(Vec3::new(x, y, z));
    }

    /// Buig de mesh opnieuw als er iets veranderd is.
    #[wasm_bindgen]
    pub fn evaluate(&mut self) -> Result<(), JsValue> {
        self.try_evaluate().map(|_| ()).map_err(to_js_error)
    }

    /// Haalt de gebogen mesh op.
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let export = self.mesh_export().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&export).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Default for BendEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BendEngine {
    /// # Errors
    /// [`EngineError::FlatArrayLength`] for arrays that are not xyz triples, or a
    /// [`MeshError`] from mesh validation.
    pub fn try_load_source(
        &mut self,
        positions: &[f64],
        normals: &[f64],
        triangles: Vec<u32>,
    ) -> Result<(), EngineError> {
        let positions: Vec<Point3> = triples("positions", positions)?
            .map(Point3::from_array)
            .collect();
        let mut builder = SourceMesh::builder(positions, triangles);
        if !normals.is_empty() {
            builder = builder.with_normals(triples("normals", normals)?.map(Vec3::from_array).collect());
        }
        let mesh = builder.build()?;
        debug_log!(
            "bronmesh geladen: {} vertices, {} driehoeken",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.bender.set_source(Rc::new(mesh));
        Ok(())
    }

    /// Replace the spline and re-apply the current binding to it. On error the engine keeps the
    /// previous spline and binding.
    ///
    /// # Errors
    /// [`CurveError`] for fewer than two nodes, or the rebind error when the previous binding
    /// no longer fits the new spline.
    pub fn try_set_nodes(&mut self, nodes: Vec<SplineNode>) -> Result<(), EngineError> {
        let is_loop = self.spline.as_ref().is_some_and(|spline| spline.is_loop());
        let spline = Rc::new(Spline::new(nodes, is_loop)?);
        if let Some(binding) = self.binding {
            self.apply_binding(&spline, binding)?;
        }
        self.spline = Some(spline);
        Ok(())
    }

    /// # Errors
    /// [`EngineError::NoSpline`] before any nodes were set, or [`EngineError::CurveIndex`] when
    /// opening the spline removes the bound curve. The spline is left unchanged on error.
    pub fn try_set_loop(&mut self, is_loop: bool) -> Result<(), EngineError> {
        let spline = Rc::clone(self.spline.as_ref().ok_or(EngineError::NoSpline)?);
        if let Some(EngineBinding::Curve(index)) = self.binding {
            let count = spline.node_count() - usize::from(!is_loop);
            if index >= count {
                return Err(EngineError::CurveIndex { index, count });
            }
        }
        spline.set_loop(is_loop);
        // A bound curve is a copy of one spline segment; refresh it.
        if let Some(binding @ EngineBinding::Curve(_)) = self.binding {
            self.apply_binding(&spline, binding)?;
        }
        Ok(())
    }

    /// Bend along a copy of spline curve `index`.
    ///
    /// # Errors
    /// [`EngineError::NoSpline`], or [`EngineError::CurveIndex`] for a missing curve.
    pub fn try_bind_curve(&mut self, index: usize) -> Result<(), EngineError> {
        self.try_bind(EngineBinding::Curve(index))
    }

    /// Bend along the spline from `start`; `end` is kept for reference.
    ///
    /// # Errors
    /// [`EngineError::NoSpline`], or [`BindingError::OutOfRange`] unless `start` lies strictly
    /// inside the spline.
    pub fn try_bind_path(&mut self, start: f64, end: f64) -> Result<(), EngineError> {
        self.try_bind(EngineBinding::Path { start, end })
    }

    fn try_bind(&mut self, binding: EngineBinding) -> Result<(), EngineError> {
        let spline = Rc::clone(self.spline.as_ref().ok_or(EngineError::NoSpline)?);
        self.apply_binding(&spline, binding)?;
        self.binding = Some(binding);
        Ok(())
    }

    /// Validates `binding` against `spline` before the bender is touched.
    fn apply_binding(
        &mut self,
        spline: &Rc<Spline>,
        binding: EngineBinding,
    ) -> Result<(), EngineError> {
        match binding {
            EngineBinding::Curve(index) => {
                let count = spline.curve_count();
                if index >= count {
                    return Err(EngineError::CurveIndex { index, count });
                }
                let nodes = spline.nodes();
                let start = nodes[index];
                let end = nodes[(index + 1) % nodes.len()];
                let curve = Rc::new(CubicCurve::new(start, end));
                self.bender
                    .set_curve_interval(Some(Rc::clone(&curve) as Rc<dyn SampleProvider>))?;
                self.curve = Some(curve);
            }
            EngineBinding::Path { start, end } => {
                let provider = Rc::clone(spline) as Rc<dyn SampleProvider>;
                self.bender.set_path_interval(Some(provider), start, end)?;
                self.curve = None;
            }
        }
        Ok(())
    }

    /// Bend when dirty. Returns the pass diagnostics, or `None` when nothing changed.
    ///
    /// # Errors
    /// [`EngineError::NoSource`] / [`EngineError::NotBound`] when the bender cannot run.
    pub fn try_evaluate(&mut self) -> Result<Option<BendDiagnostics>, EngineError> {
        {
            let config = self.bender.config();
            if config.source().is_none() {
                return Err(EngineError::NoSource);
            }
            if !config.binding().is_bound() {
                return Err(EngineError::NotBound);
            }
        }
        let diagnostics = self.bender.compute_if_needed();
        if diagnostics.is_none() {
            debug_log!("evaluate: geen wijzigingen");
        }
        Ok(diagnostics)
    }

    /// # Errors
    /// [`EngineError::NotEvaluated`] while the bender has pending changes.
    pub fn mesh_export(&self) -> Result<MeshExport, EngineError> {
        if self.bender.is_dirty() {
            return Err(EngineError::NotEvaluated);
        }
        let result = self.bender.result();
        Ok(MeshExport {
            vertices: result.vertices().iter().map(|p| p.to_array()).collect(),
            normals: result.normals().iter().map(|n| n.to_array()).collect(),
            triangles: result.triangles().to_vec(),
            bounds: result.bounds().map(|bounds| BoundsExport {
                min: bounds.min.to_array(),
                max: bounds.max.to_array(),
            }),
        })
    }

    #[must_use]
    pub fn spline(&self) -> Option<&Rc<Spline>> {
        self.spline.as_ref()
    }
}

fn triples<'a>(
    name: &'static str,
    values: &'a [f64],
) -> Result<impl Iterator<Item = [f64; 3]> + 'a, EngineError> {
    if values.len() % 3 != 0 {
        return Err(EngineError::FlatArrayLength {
            name,
            len: values.len(),
        });
    }
    Ok(values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]))
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
