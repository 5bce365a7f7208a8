//! Installer script served at `/`

use crate::config::MirrorConfig;

/// Render the bootstrap script that clones the repository and runs its
/// own `install.sh`
pub fn render_install_script(mirror: &MirrorConfig) -> String {
    let repo = &mirror.repo;
    format!(
        "#!/bin/bash
sudo pacman -S --noconfirm --needed git
git clone {clone_url} -b {branch}
cd {repo}
chmod +x ./install.sh
./install.sh
cd ..
rm -rf {repo}
",
        clone_url = mirror.clone_url(),
        branch = mirror.branch,
    )
}
