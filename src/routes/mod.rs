pub mod blogs;
pub mod chat;
pub mod credits;
pub mod embed;
pub mod files;
pub mod users;
pub mod widgets;

use actix_web::web;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/widgets").configure(widgets::create_routes))
        .service(web::scope("/chat").configure(chat::create_routes))
        .service(web::scope("/credits").configure(credits::create_routes))
        .service(web::scope("/blogs").configure(blogs::create_routes))
        .service(web::scope("/files").configure(files::create_routes))
        .service(web::scope("/users").configure(users::create_routes));
}
