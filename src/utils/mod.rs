use std::path::PathBuf;

pub fn get_app_data_dir() -> PathBuf {
    match std::env::var("BANANAPREP_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let mut path = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()));
            path.push(".local/share/bananaprep");
            path
        }
    }
}

pub fn get_database_path() -> PathBuf {
    let mut path = get_app_data_dir();
    path.push("bananaprep.db");
    path
}
