//! Building statements without a database.
//!
//! Run with: cargo run --example basic -p sqlqb

use sqlqb::{params, qb, Operand, QbError, Value};

fn main() -> Result<(), QbError> {
    // SELECT with joins, nested groups and an IN list
    let q = qb::table("users u")
        .select_cols(&["u.id", "u.name", "t.name AS team"])
        .left_join("teams t", "t.id = u.team_id")
        .eq("u.status", "active")
        .group_start()
        .gt("u.age", 18)
        .or_where_in("u.role", ["admin", "owner"])
        .group_end()
        .order_desc("u.created_at")
        .paginate(2, 20)
        .read();
    println!("{}\n  params: {:?}\n  debug:  {q}\n", q.statement(), q.params());

    // Filters from user input: "[AND|OR] column [operator]" specs
    let filters: [(&str, Operand); 2] = [("name LIKE", "al%".into()), ("or id", vec![1, 2, 3].into())];
    let q = qb::table("users").where_auto_list(filters)?.read();
    println!("{q}\n");

    // Count over a grouped query is wrapped as a derived table
    let q = qb::table("orders")
        .group_by("customer_id")
        .having("SUM(total) > ?", params![100])
        .count();
    println!("{q}\n");

    // Writes
    let q = qb::table("users")
        .add("name", "alice")
        .add_raw("created_at", "NOW()")
        .insert_ignore();
    println!("{q}");

    let q = qb::table("users")
        .add("status", "inactive")
        .increment("version", 1)
        .eq("id", 7)
        .update();
    println!("{q}");

    let q = qb::table("sessions s")
        .inner_join("users u", "u.id = s.user_id")
        .eq("u.status", "banned")
        .delete();
    println!("{q}");

    let q = qb::table("tags").insert_all([
        vec![("post_id", Value::from(1)), ("tag", Value::from("rust"))],
        vec![("post_id", Value::from(1)), ("tag", Value::from("sql"))],
    ]);
    println!("{q}");

    // Malformed specs fail fast
    if let Err(e) = qb::table("users").where_auto("name; DROP TABLE users", "x") {
        println!("\nrejected: {e}");
    }

    Ok(())
}
