//! Request handlers, one file per verb.
//!
//! Handlers never decide access themselves. Each one calls the configured
//! ownership resolver and passes the resolved team to the query module.

use crate::layout::{relative_module, ArtifactKind, HandlerVerb};

use super::queries::QueryNames;
use super::{banner, GenContext, GeneratedArtifact};

/// Verbs emitted for this collection, in a fixed order.
pub fn verbs(ctx: &GenContext) -> Vec<HandlerVerb> {
    HandlerVerb::ALL
        .into_iter()
        .filter(|verb| match verb {
            HandlerVerb::Reorder => ctx.schema.is_sortable(),
            HandlerVerb::Move => ctx.schema.is_hierarchical(),
            _ => true,
        })
        .collect()
}

pub fn generate(ctx: &GenContext) -> Vec<GeneratedArtifact> {
    verbs(ctx)
        .into_iter()
        .map(|verb| {
            let path = ctx.layout.handler(verb);
            let content = handler(ctx, verb, &relative_module(&path, &ctx.layout.queries().with_extension("")));
            GeneratedArtifact::new(ArtifactKind::Handler(verb), path, content)
        })
        .collect()
}

fn handler(ctx: &GenContext, verb: HandlerVerb, queries_module: &str) -> String {
    let n = ctx.naming;
    let q = QueryNames::new(n);
    let resolver = &ctx.ownership.function;
    let param = &n.item_param;

    let mut code = banner(ctx);
    code.push_str(&format!(
        "import {{ {} }} from '{}'\n",
        resolver, ctx.ownership.module
    ));

    let body = match verb {
        HandlerVerb::List => {
            code.push_str(&format!("import {{ {}, {} }} from '{}'\n", q.get_all, q.get_by_ids, queries_module));
            format!(
                r#"  const {{ team }} = await {resolver}(event)
  const query = getQuery(event)
  if (query.ids) {{
    const ids = String(query.ids).split(',').filter(Boolean)
    return await {get_by_ids}(team.id, ids)
  }}
  return await {get_all}(team.id)
"#,
                get_all = q.get_all,
                get_by_ids = q.get_by_ids,
            )
        }
        HandlerVerb::Create => {
            code.push_str(&schema_import(ctx, verb));
            code.push_str(&format!("import {{ {} }} from '{}'\n", q.create, queries_module));
            format!(
                r#"  const {{ team, user }} = await {resolver}(event)
  const body = await readValidatedBody(event, {schema}.parse)
  return await {create}({{
    ...body,
    teamId: team.id,
    owner: user.id,
    createdBy: user.id,
    updatedBy: user.id,
  }})
"#,
                schema = schema_ident(ctx),
                create = q.create,
            )
        }
        HandlerVerb::Update => {
            code.push_str(&schema_import(ctx, verb));
            code.push_str(&format!("import {{ {} }} from '{}'\n", q.update, queries_module));
            format!(
                r#"  const {{ team, user }} = await {resolver}(event)
  const {{ {param} }} = getRouterParams(event)
  const body = await readValidatedBody(event, {schema}.partial().parse)
  return await {update}({param}, team.id, {{ ...body, updatedBy: user.id }})
"#,
                schema = schema_ident(ctx),
                update = q.update,
            )
        }
        HandlerVerb::Delete => {
            code.push_str(&format!("import {{ {} }} from '{}'\n", q.delete, queries_module));
            format!(
                r#"  const {{ team }} = await {resolver}(event)
  const {{ {param} }} = getRouterParams(event)
  return await {delete}({param}, team.id)
"#,
                delete = q.delete,
            )
        }
        HandlerVerb::Reorder => {
            code.push_str("import { z } from 'zod'\n");
            code.push_str(&format!("import {{ {} }} from '{}'\n", q.reorder, queries_module));
            format!(
                r#"  const {{ team }} = await {resolver}(event)
  const body = await readValidatedBody(event, z.object({{
    items: z.array(z.object({{
      id: z.string(),
      order: z.number().int(),
      parentId: z.string().nullable().optional(),
    }})),
  }}).parse)
  return await {reorder}(team.id, body.items)
"#,
                reorder = q.reorder,
            )
        }
        HandlerVerb::Move => {
            code.push_str("import { z } from 'zod'\n");
            code.push_str(&format!("import {{ {} }} from '{}'\n", q.move_item, queries_module));
            format!(
                r#"  const {{ team }} = await {resolver}(event)
  const {{ {param} }} = getRouterParams(event)
  const body = await readValidatedBody(event, z.object({{
    parentId: z.string().nullable(),
    order: z.number().int(),
  }}).parse)
  return await {move_item}({param}, team.id, body.parentId, body.order)
"#,
                move_item = q.move_item,
            )
        }
    };

    code.push_str("\nexport default defineEventHandler(async (event) => {\n");
    code.push_str(&body);
    code.push_str("})\n");
    code
}

fn schema_ident(ctx: &GenContext) -> String {
    format!("{}Schema", ctx.naming.prefixed_plural_camel)
}

fn schema_import(ctx: &GenContext, verb: HandlerVerb) -> String {
    let composable = ctx.layout.composable().with_extension("");
    format!(
        "import {{ {} }} from '{}'\n",
        schema_ident(ctx),
        relative_module(&ctx.layout.handler(verb), &composable)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::Fixture;
    use crate::config::{CollectionOptions, Dialect};
    use serde_json::json;

    #[test]
    fn test_crud_handlers_call_resolver() {
        let fixture = Fixture::blog_posts();
        let artifacts = generate(&fixture.ctx(Dialect::Sqlite));
        assert_eq!(artifacts.len(), 4);
        for artifact in &artifacts {
            assert!(artifact
                .content
                .contains("import { resolveTeamAndCheckMembership } from '@layerkit/core/server'"));
            assert!(artifact.content.contains("await resolveTeamAndCheckMembership(event)"));
        }
    }

    #[test]
    fn test_relative_imports() {
        let fixture = Fixture::blog_posts();
        let artifacts = generate(&fixture.ctx(Dialect::Sqlite));
        let list = &artifacts[0];
        assert!(list.relative_path.ends_with("server/api/teams/[id]/blog-posts/index.get.ts"));
        assert!(list
            .content
            .contains("import { getAllBlogPosts, getBlogPostsByIds } from '../../../../database/queries'"));

        let update = &artifacts[2];
        assert!(update.content.contains("const { postId } = getRouterParams(event)"));
        assert!(update.content.contains("updateBlogPost(postId, team.id"));
        assert!(update
            .content
            .contains("from '../../../../../app/composables/useBlogPosts'"));
    }

    #[test]
    fn test_hierarchy_adds_reorder_and_move() {
        let fixture = Fixture::new(
            "docs",
            "pages",
            json!({ "title": { "type": "string" } }),
            CollectionOptions { hierarchy: true, ..Default::default() },
        );
        let ctx = fixture.ctx(Dialect::Sqlite);
        assert_eq!(verbs(&ctx).len(), 6);
        let artifacts = generate(&ctx);
        let mv = artifacts.last().unwrap();
        assert!(mv.relative_path.ends_with("docs-pages/[pageId]/move.patch.ts"));
        assert!(mv.content.contains("from '../../../../../database/queries'"));
    }

    #[test]
    fn test_custom_resolver() {
        let mut fixture = Fixture::blog_posts();
        fixture.ownership.module = "~/server/utils/access".to_string();
        fixture.ownership.function = "requireTeamMember".to_string();
        let artifacts = generate(&fixture.ctx(Dialect::Sqlite));
        assert!(artifacts[0].content.contains("import { requireTeamMember } from '~/server/utils/access'"));
    }
}
