use post_query::parse;
use serde_json::json;

#[test]
fn tree_serializes_as_tagged_nodes() {
    let query = parse("cat* -user:bob (a or b)", ["user"]).unwrap();
    let value = serde_json::to_value(&query).unwrap();
    assert_eq!(
        value,
        json!({
            "root": {
                "and": [
                    { "tag": { "name": "cat*", "wildcard": true } },
                    { "not": { "metatag": {
                        "name": "user",
                        "kind": "text",
                        "value": "bob",
                        "quoted": false
                    } } },
                    { "group": { "or": [
                        { "tag": { "name": "a", "wildcard": false } },
                        { "tag": { "name": "b", "wildcard": false } }
                    ] } }
                ]
            }
        })
    );
}

#[test]
fn comparisons_serialize_with_their_operands() {
    let query = parse("score:>=10 comments:1...5 width:..300", ["score", "comments", "width"]).unwrap();
    let value = serde_json::to_value(&query).unwrap();
    let parts = &value["root"]["and"];

    assert_eq!(
        parts[0]["metatag"]["comparison"],
        json!({ "compare": { "op": "gte", "operand": "10" } })
    );
    assert_eq!(
        parts[1]["metatag"]["kind"],
        json!({ "count_alias": "comment_count" })
    );
    assert_eq!(
        parts[1]["metatag"]["comparison"],
        json!({ "range": { "start": "1", "end": "5", "bound": "exclusive" } })
    );
    assert_eq!(
        parts[2]["metatag"]["comparison"],
        json!({ "range": { "start": null, "end": "300", "bound": "inclusive" } })
    );
}
