//! Prints the GitLabIdentityProvider CRD manifest as YAML.

use kube::CustomResourceExt;

fn main() {
    let crd = crds::GitLabIdentityProvider::crd();
    match serde_yaml::to_string(&crd) {
        Ok(yaml) => print!("{yaml}"),
        Err(e) => {
            eprintln!("failed to render CRD: {e}");
            std::process::exit(1);
        }
    }
}
