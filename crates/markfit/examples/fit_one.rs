use markfit::{Pipeline, PipelineConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image.png> [filled.png] [marked.png]", args[0]);
        std::process::exit(2);
    }

    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let image = image::open(Path::new(&args[1]))?.to_rgb8();

    let fit = match pipeline.fit_image(&image) {
        Ok(fit) => fit,
        Err(e) => {
            println!("No ellipse: {e}");
            return Ok(());
        }
    };
    println!(
        "center=({:.1}, {:.1}) semi_major={:.1} semi_minor={:.1} angle={:.1}deg",
        fit.ellipse.center[0],
        fit.ellipse.center[1],
        fit.ellipse.semi_major,
        fit.ellipse.semi_minor,
        fit.ellipse.angle_deg,
    );

    let (filled, marked) = pipeline.render(&image, &fit);
    if let Some(path) = args.get(2) {
        filled.save(path)?;
        println!("Wrote {path}");
    }
    if let Some(path) = args.get(3) {
        marked.save(path)?;
        println!("Wrote {path}");
    }
    Ok(())
}
