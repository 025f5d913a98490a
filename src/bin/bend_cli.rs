#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("bend_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use mesh_bender::bend::{BendDiagnostics, MeshBender, ResultBuffer, SourceMesh};
    use mesh_bender::geom::{Point3, Vec3};
    use mesh_bender::path::{CubicCurve, SampleProvider, Spline, SplineNode};
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    const USAGE: &str = r#"bend_cli (mesh-bender)

USAGE:
  bend_cli list
  bend_cli run <scenario|all> [options]

SCENARIOS:
  strip_straight_curve
  box_quarter_arc
  ribbon_twist
  box_s_path
  strip_loop_wrap

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() {
                return Err("use either --out-dir or --obj (not both)".to_string());
            }
            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    let output = run_scenario(*scenario)?;
                    let path = dir.join(format!("{}.obj", output.name));
                    write_obj_file(&path, &output.result, output.name, overwrite)?;
                    eprintln!("wrote {}", path.display());
                    print_summary(&output);
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            let output = run_scenario(scenario)?;
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.result, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
            print_summary(&output);
            return Ok(());
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.result, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }
        print_summary(&output);

        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        let d = &output.diagnostics;
        eprintln!(
            "{}: vertices={} triangles={} samples={} cache_hits={}",
            output.name,
            d.vertex_count,
            output.result.triangles().len() / 3,
            d.samples_resolved,
            d.cache_hits
        );
        if let Some(bounds) = output.result.bounds() {
            eprintln!(
                "  bounds min=({:.3}, {:.3}, {:.3}) max=({:.3}, {:.3}, {:.3})",
                bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
            );
        }
        if let Some(timing) = d.timing.as_ref() {
            eprintln!("  timing: {:.3} ms", timing.total_ms());
        }
        for warning in &d.warnings {
            eprintln!("  warning: {warning}");
        }
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        msg.push_str(&format!("unknown scenario `{name}`\n\navailable scenarios:\n"));
        for scenario in Scenario::ALL {
            msg.push_str(&format!("  {}\n", scenario.name()));
        }
        msg
    }

    fn write_obj_file(
        path: &Path,
        result: &ResultBuffer,
        name: &str,
        overwrite: bool,
    ) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# mesh-bender bend_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;
        result
            .write_obj(&mut w)
            .map_err(|e| format!("write obj: {e}"))?;

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    struct ScenarioOutput {
        name: &'static str,
        result: ResultBuffer,
        diagnostics: BendDiagnostics,
    }

    #[derive(Debug, Clone, Copy)]
    enum Scenario {
        StripStraightCurve,
        BoxQuarterArc,
        RibbonTwist,
        BoxSPath,
        StripLoopWrap,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::StripStraightCurve,
            Scenario::BoxQuarterArc,
            Scenario::RibbonTwist,
            Scenario::BoxSPath,
            Scenario::StripLoopWrap,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::StripStraightCurve => "strip_straight_curve",
                Scenario::BoxQuarterArc => "box_quarter_arc",
                Scenario::RibbonTwist => "ribbon_twist",
                Scenario::BoxSPath => "box_s_path",
                Scenario::StripLoopWrap => "strip_loop_wrap",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let mut bender = MeshBender::new();

        // Providers must outlive the compute call; keep them in scope.
        let _provider: Rc<dyn SampleProvider> = match scenario {
            Scenario::StripStraightCurve => {
                bender.set_source(Rc::new(strip_mesh(10.0, 1.0, 8)?));
                let curve: Rc<dyn SampleProvider> = Rc::new(CubicCurve::new(
                    node([0.0, 0.0, 0.0], [0.0, 0.0, 4.0]),
                    node([0.0, 0.0, 12.0], [0.0, 0.0, 16.0]),
                ));
                bender
                    .set_curve_interval(Some(Rc::clone(&curve)))
                    .map_err(|e| e.to_string())?;
                curve
            }
            Scenario::BoxQuarterArc => {
                bender.set_source(Rc::new(box_mesh(10.0, 0.5, 16)?));
                // Handle length 0.5523 * r approximates a quarter circle.
                let r = 10.0;
                let k = 0.5523 * r;
                let curve: Rc<dyn SampleProvider> = Rc::new(CubicCurve::new(
                    node([0.0, 0.0, 0.0], [0.0, 0.0, k]),
                    node([r, 0.0, r], [r + k, 0.0, r]),
                ));
                bender
                    .set_curve_interval(Some(Rc::clone(&curve)))
                    .map_err(|e| e.to_string())?;
                curve
            }
            Scenario::RibbonTwist => {
                bender.set_source(Rc::new(strip_mesh(10.0, 1.0, 32)?));
                bender.set_scale(Vec3::new(1.0, 1.5, 1.0));
                let curve: Rc<dyn SampleProvider> = Rc::new(CubicCurve::new(
                    node([0.0, 0.0, 0.0], [0.0, 0.0, 5.0]).with_roll(0.0),
                    node([0.0, 0.0, 15.0], [0.0, 0.0, 20.0])
                        .with_roll(180.0)
                        .with_scale(0.5, 2.0),
                ));
                bender
                    .set_curve_interval(Some(Rc::clone(&curve)))
                    .map_err(|e| e.to_string())?;
                curve
            }
            Scenario::BoxSPath => {
                bender.set_source(Rc::new(box_mesh(20.0, 0.5, 40)?));
                let spline: Rc<dyn SampleProvider> = Rc::new(
                    Spline::new(
                        vec![
                            node([0.0, 0.0, 0.0], [0.0, 0.0, 4.0]),
                            node([5.0, 0.0, 10.0], [5.0, 0.0, 14.0]),
                            node([0.0, 0.0, 20.0], [0.0, 0.0, 24.0]),
                            node([5.0, 0.0, 30.0], [5.0, 0.0, 34.0]),
                        ],
                        false,
                    )
                    .map_err(|e| e.to_string())?,
                );
                bender
                    .set_path_interval(Some(Rc::clone(&spline)), 2.0, 22.0)
                    .map_err(|e| e.to_string())?;
                spline
            }
            Scenario::StripLoopWrap => {
                bender.set_source(Rc::new(strip_mesh(12.0, 0.5, 24)?));
                let spline: Rc<dyn SampleProvider> = Rc::new(
                    Spline::new(
                        vec![
                            node([10.0, 0.0, 0.0], [10.0, 0.0, 5.0]),
                            node([0.0, 0.0, 10.0], [-5.0, 0.0, 10.0]),
                            node([-10.0, 0.0, 0.0], [-10.0, 0.0, -5.0]),
                            node([0.0, 0.0, -10.0], [5.0, 0.0, -10.0]),
                        ],
                        true,
                    )
                    .map_err(|e| e.to_string())?,
                );
                // Start close to the end so the strip wraps past the seam.
                let start = spline.length() - 4.0;
                bender
                    .set_path_interval(Some(Rc::clone(&spline)), start, start + 12.0)
                    .map_err(|e| e.to_string())?;
                spline
            }
        };

        let diagnostics = bender.compute();
        if !diagnostics.bent {
            return Err(format!("{} did not bend: {:?}", scenario.name(), diagnostics.warnings));
        }
        let result = bender.result().clone();

        Ok(ScenarioOutput {
            name: scenario.name(),
            result,
            diagnostics,
        })
    }

    fn node(position: [f64; 3], direction: [f64; 3]) -> SplineNode {
        SplineNode::new(Point3::from_array(position), Point3::from_array(direction))
    }

    /// Flat strip along X with `segments` columns, facing +Z.
    fn strip_mesh(length: f64, half_width: f64, segments: u32) -> Result<SourceMesh, String> {
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for i in 0..=segments {
            let u = f64::from(i) / f64::from(segments);
            positions.push(Point3::new(u * length, -half_width, 0.0));
            positions.push(Point3::new(u * length, half_width, 0.0));
            uvs.push([u, 0.0]);
            uvs.push([u, 1.0]);
        }
        let mut triangles = Vec::new();
        for i in 0..segments {
            let a = i * 2;
            triangles.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
        }
        let normals = vec![Vec3::Z; positions.len()];
        SourceMesh::builder(positions, triangles)
            .with_normals(normals)
            .with_uv_channel(uvs)
            .build()
            .map_err(|e| e.to_string())
    }

    /// Square tube along X with `segments` rings and radial normals.
    fn box_mesh(length: f64, half_size: f64, segments: u32) -> Result<SourceMesh, String> {
        const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for i in 0..=segments {
            let x = f64::from(i) / f64::from(segments) * length;
            for (y, z) in CORNERS {
                positions.push(Point3::new(x, y * half_size, z * half_size));
                normals.push(Vec3::new(0.0, y, z).normalized().unwrap_or(Vec3::Y));
            }
        }
        let mut triangles = Vec::new();
        for i in 0..segments {
            for k in 0..4u32 {
                let a = i * 4 + k;
                let b = i * 4 + (k + 1) % 4;
                let c = a + 4;
                let d = b + 4;
                triangles.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        SourceMesh::builder(positions, triangles)
            .with_normals(normals)
            .build()
            .map_err(|e| e.to_string())
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
