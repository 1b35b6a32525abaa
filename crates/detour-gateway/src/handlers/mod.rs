mod content;
mod health;
mod redirect;
mod settings;

pub use content::{delete_content_handler, get_content_handler, put_content_handler};
pub use health::health_handler;
pub use redirect::{
    active_redirects_handler, bulk_import_handler, create_redirect_handler,
    delete_redirect_handler, get_redirect_handler, list_redirects_handler,
    update_redirect_handler,
};
pub use settings::{get_global_handler, put_global_handler};
