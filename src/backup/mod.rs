pub mod archiver;
pub mod backup_config;
pub mod command;
pub mod inventory;
pub mod pipeline;
pub mod plugin;
pub mod result_error;
pub mod retention;
pub mod runner;
pub mod size;
pub mod tool;
pub mod validate;
pub mod workspace;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
