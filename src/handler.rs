// HTTP handler bindings
//
// Thin wrappers that bind Rocket routes to the Bot: deserialize the tick
// request, pull the Bot from managed state, delegate, serialize the answer.

use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::Value;

use tail_safe_snake::bot::Bot;
use tail_safe_snake::types::TickRequest;

/// GET / endpoint
/// Returns bot metadata
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /start endpoint
#[post("/start", format = "json", data = "<start_req>")]
pub fn start(bot: &rocket::State<Bot>, start_req: Json<TickRequest>) -> Status {
    bot.start(start_req.turn, &start_req.world);

    Status::Ok
}

/// POST /move endpoint
/// Called each tick to compute and return the next move
#[post("/move", format = "json", data = "<move_req>")]
pub async fn get_move(bot: &rocket::State<Bot>, move_req: Json<TickRequest>) -> Json<Value> {
    let response = bot.get_move(move_req.turn, &move_req.world).await;

    Json(response)
}

/// POST /end endpoint
#[post("/end", format = "json", data = "<end_req>")]
pub fn end(bot: &rocket::State<Bot>, end_req: Json<TickRequest>) -> Status {
    bot.end(end_req.turn, &end_req.world);

    Status::Ok
}
