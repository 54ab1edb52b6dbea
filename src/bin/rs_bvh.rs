// command line options
use structopt::StructOpt;
// bvh
use rs_bvh::accelerators::simple::SimpleAccel;
use rs_bvh::core::bvh::{Accelerator, Float};
use rs_bvh::core::geometry::Vector3f;
use rs_bvh::core::mesh::Mesh;
use rs_bvh::integrators::ao::{AmbientOcclusion, Camera, Timer};
// std
use std::path::PathBuf;
use std::process;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEGREES_TO_RADIANS: Float = 0.017_453_292;
const PLANE_SIZE: Float = 5.0;

/// Render an ambient-occlusion image of an OBJ mesh through the BVH.
#[derive(StructOpt)]
struct Cli {
    /// image width
    #[structopt(short = "w", long = "width", default_value = "1920")]
    width: u32,
    /// image height
    #[structopt(long = "height", default_value = "1080")]
    height: u32,
    /// samples per pixel
    #[structopt(short = "s", long = "samples", default_value = "16")]
    samples: u32,
    /// up axis of the model (0 = x, 1 = y, 2 = z)
    #[structopt(long = "axis", default_value = "1")]
    axis: usize,
    /// render the model without a ground plane
    #[structopt(long = "no-plane")]
    no_plane: bool,
    /// triangles per BVH leaf
    #[structopt(long = "leaf-size", default_value = "4")]
    leaf_size: u32,
    /// output image
    #[structopt(short = "o", long = "output", default_value = "output.png", parse(from_os_str))]
    output: PathBuf,
    /// the OBJ file to render
    #[structopt(parse(from_os_str))]
    path: PathBuf,
}

fn error(message: String) -> ! {
    eprintln!("ERROR: {}", message);
    process::exit(1);
}

fn main() {
    let cli = Cli::from_args();
    if cli.axis > 2 {
        error(format!("axis {} out of range", cli.axis));
    }

    // read the mesh
    let mut time_read = Timer::default();
    time_read.begin();
    let mut mesh = match Mesh::from_obj(&cli.path) {
        Ok(mesh) => mesh,
        Err(e) => error(format!("failed to read {}: {}", cli.path.display(), e)),
    };
    time_read.end();
    if mesh.triangles() == 0 {
        error(format!("no triangles in {}", cli.path.display()));
    }
    println!(
        "Read {} triangles in {:.2}s (rs_bvh {})",
        mesh.triangles(),
        time_read.seconds(),
        VERSION
    );

    // fallback viewpoint: back away from the model centre along a fixed
    // diagonal, three bounding radii out
    let mut up = Vector3f::new(0.0, 0.0, 0.0);
    up[cli.axis] = 1.0;
    let camera = Camera {
        to: mesh.centre(),
        from: mesh.centre() + Vector3f::new(0.2, 0.3, 0.4) * (3.0 * mesh.radius()),
        up,
        fov: DEGREES_TO_RADIANS * 90.0,
    };

    if !cli.no_plane {
        mesh.add_plane(cli.axis, PLANE_SIZE);
    }

    // build the BVH
    let mut time_build = Timer::default();
    time_build.begin();
    let mut accel = SimpleAccel::with_max_node_size(cli.leaf_size);
    accel.build(&mesh.view());
    time_build.end();
    println!(
        "Built BVH over {} triangles in {:.2}s ({} nodes)",
        mesh.triangles(),
        time_build.seconds(),
        accel.nodes.len()
    );

    // render
    println!(
        "Rendering {}x{} ambient occlusion image with {} samples per pixel",
        cli.width, cli.height, cli.samples
    );
    let mut time_render = Timer::default();
    time_render.begin();
    let mut ao = AmbientOcclusion::new(&mesh, &accel, cli.width, cli.height, &camera);
    for _ in 0..cli.samples {
        ao.refine();
    }
    time_render.end();
    println!("Rendered in {:.2}s", time_render.seconds());

    let stats = ao.stats();
    println!("Traced:");
    println!(
        "   {} primary rays in {:.2}s ({:.2} Mrays/s)",
        stats.primary_count,
        stats.primary_timer.seconds(),
        stats.primary_count as f64 * 1.0e-6 / stats.primary_timer.seconds()
    );
    println!(
        "   {} shadow rays in {:.2}s ({:.2} Mrays/s)",
        stats.shadow_count,
        stats.shadow_timer.seconds(),
        stats.shadow_count as f64 * 1.0e-6 / stats.shadow_timer.seconds()
    );

    if let Err(e) = ao.film().write_png(&cli.output) {
        error(format!("failed to write {}: {}", cli.output.display(), e));
    }
    println!("Wrote {}", cli.output.display());
}
