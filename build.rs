use std::path::PathBuf;
use std::process::Command;

const SHADERS: [(&str, &str); 2] = [
    ("SampleVertexShader", "vs_4_0_level_9_3"),
    ("SamplePixelShader", "ps_4_0_level_9_3"),
];

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    if std::env::var("CARGO_FEATURE_BUILD_DATA").is_ok() {
        // OUT_DIR is target/<profile>/build/<pkg>/out, compiled shaders are deployed next to the executable
        let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR not set"));
        let deploy_dir = out_dir.ancestors().nth(3).expect("unexpected OUT_DIR layout").to_path_buf();

        for (name, profile) in SHADERS {
            let output = Command::new("fxc")
                .arg("/nologo")
                .arg("/T")
                .arg(profile)
                .arg("/E")
                .arg("main")
                .arg("/Fo")
                .arg(deploy_dir.join(format!("{}.cso", name)))
                .arg(format!("shaders/{}.hlsl", name))
                .output()
                .expect("fxc failed");

            println!("{}", String::from_utf8_lossy(&output.stdout));
            println!("{}", String::from_utf8_lossy(&output.stderr));
            if !output.status.success() {
                panic!("fxc failed to compile {}", name);
            }
        }
    }
}
