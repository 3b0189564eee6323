mod repeating {
    use formwork::{
        ComponentRegistry, DataSources, FormData, LayoutSetDef, NodeChildren, ResolveOutput,
        resolve_layout_set,
    };
    use serde_json::json;

    fn layouts(raw: serde_json::Value) -> LayoutSetDef {
        serde_json::from_value(raw).unwrap()
    }

    fn form_data(model: serde_json::Value) -> FormData {
        let mut fd = FormData::new();
        fd.insert_model("Model", model);
        fd.ensure_row_ids();
        fd
    }

    fn resolve(layouts: &LayoutSetDef, fd: &FormData) -> ResolveOutput {
        let sources = DataSources::new(fd, fd, "Model");
        resolve_layout_set(layouts, "form", &ComponentRegistry::standard(), &sources, None).unwrap()
    }

    #[test]
    fn rows_get_suffixed_ids_and_per_row_bindings() {
        let layouts = layouts(json!({ "pages": { "form": [
            { "id": "G", "type": "Group", "maxCount": 3,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Persons" } },
              "children": ["Name"] },
            { "id": "Name", "type": "Input",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Persons.name" } } },
        ]}}));
        let fd = form_data(json!({ "Persons": [ { "name": "Ada" }, { "name": "Brendan" } ] }));

        let out = resolve(&layouts, &fd);
        let group = out.pages.find_by_id("G").unwrap();
        let NodeChildren::Rows(rows) = &group.children else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);

        for (i, row) in rows.iter().enumerate() {
            let name = &row.items[0];
            assert_eq!(name.item.id, format!("Name-{i}"));
            assert_eq!(name.base_component_id.as_deref(), Some("Name"));
            assert_eq!(
                name.item.data_model_bindings["simpleBinding"].field,
                format!("Persons[{i}].name")
            );
        }
    }

    #[test]
    fn bindings_to_other_data_models_pass_through_unchanged() {
        let layouts = layouts(json!({ "pages": { "form": [
            { "id": "orders", "type": "Group", "maxCount": 5,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Orders.items" } },
              "children": ["line"] },
            { "id": "line", "type": "Input",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Orders.items" },
                  "metadata": { "dataType": "Other", "field": "Orders.items" } } },
        ]}}));
        let fd = form_data(json!({ "Orders": { "items": [ {}, {}, {} ] } }));

        let out = resolve(&layouts, &fd);
        let NodeChildren::Rows(rows) = &out.pages.find_by_id("orders").unwrap().children else {
            panic!("expected rows");
        };

        let bindings = &rows[2].items[0].item.data_model_bindings;
        assert_eq!(bindings["simpleBinding"].field, "Orders.items[2]");
        assert_eq!(bindings["metadata"].field, "Orders.items");
    }

    #[test]
    fn row_identities_follow_the_data_not_the_index() {
        let layouts = layouts(json!({ "pages": { "form": [
            { "id": "G", "type": "Group", "maxCount": 5,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Persons" } },
              "children": ["Name"] },
            { "id": "Name", "type": "Input",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Persons.name" } } },
        ]}}));
        let mut fd = form_data(json!({ "Persons": [
            { "name": "Ada" }, { "name": "Brendan" }, { "name": "Cleo" },
        ]}));

        let first = resolve(&layouts, &fd);
        let NodeChildren::Rows(rows) = &first.pages.find_by_id("G").unwrap().children else {
            panic!("expected rows");
        };
        let original: Vec<String> = rows.iter().map(|r| r.uuid.clone()).collect();

        let mut model = fd.model("Model").unwrap().clone();
        model["Persons"].as_array_mut().unwrap().remove(0);
        fd.insert_model("Model", model);

        let sources = DataSources::new(&fd, &fd, "Model");
        let second = resolve_layout_set(
            &layouts,
            "form",
            &ComponentRegistry::standard(),
            &sources,
            Some(&first.pages),
        )
        .unwrap();

        let NodeChildren::Rows(rows) = &second.pages.find_by_id("G").unwrap().children else {
            panic!("expected rows");
        };
        let remaining: Vec<String> = rows.iter().map(|r| r.uuid.clone()).collect();
        assert_eq!(remaining, original[1..]);

        assert_eq!(second.dropped_rows.len(), 1);
        assert_eq!(second.dropped_rows[0].row_uuid, original[0]);
        assert_eq!(second.dropped_rows[0].group_id, "G");
    }

    #[test]
    fn nested_groups_compose_suffixes_and_mapping_placeholders() {
        let layouts = layouts(json!({ "pages": { "form": [
            { "id": "outer", "type": "Group", "maxCount": 5,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Teams" } },
              "children": ["inner"] },
            { "id": "inner", "type": "Group", "maxCount": 5,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Teams.members" } },
              "children": ["member"] },
            { "id": "member", "type": "Dropdown",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Teams.members.name" } },
              "mapping": { "Teams[{0}].kind": "teamKind" } },
        ]}}));
        let fd = form_data(json!({ "Teams": [
            { "kind": "dev", "members": [ { "name": "Ada" }, { "name": "Brendan" } ] },
        ]}));

        let out = resolve(&layouts, &fd);
        let NodeChildren::Rows(outer_rows) = &out.pages.find_by_id("outer").unwrap().children
        else {
            panic!("expected rows");
        };
        let NodeChildren::Rows(inner_rows) = &outer_rows[0].items[0].children else {
            panic!("expected nested rows");
        };

        let member = &inner_rows[1].items[0];
        assert!(member.item.id.ends_with("-0-1"));
        assert_eq!(
            member.item.data_model_bindings["simpleBinding"].field,
            "Teams[0].members[1].name"
        );
        assert_eq!(member.item.mapping["Teams[0].kind"], "teamKind");
    }
}
