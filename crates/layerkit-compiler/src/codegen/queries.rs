//! Query module: `server/database/queries.ts`.

use crate::layout::{relative_module, ArtifactKind};
use crate::naming::NamingSet;

use super::{banner, GenContext, GeneratedArtifact, RUNTIME_PACKAGE};

/// Exported function names of the query module, shared with the handlers.
pub struct QueryNames {
    pub get_all: String,
    pub get_by_ids: String,
    pub create: String,
    pub update: String,
    pub delete: String,
    pub reorder: String,
    pub move_item: String,
    pub column_types: String,
}

impl QueryNames {
    pub fn new(n: &NamingSet) -> Self {
        Self {
            get_all: format!("getAll{}", n.prefixed_plural_pascal),
            get_by_ids: format!("get{}ByIds", n.prefixed_plural_pascal),
            create: format!("create{}", n.prefixed_singular_pascal),
            update: format!("update{}", n.prefixed_singular_pascal),
            delete: format!("delete{}", n.prefixed_singular_pascal),
            reorder: format!("reorder{}", n.prefixed_plural_pascal),
            move_item: format!("move{}", n.prefixed_singular_pascal),
            column_types: format!("{}ColumnTypes", n.prefixed_plural_camel),
        }
    }
}

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let n = ctx.naming;
    let q = QueryNames::new(n);
    let table = &n.prefixed_plural_camel;
    let item = &n.prefixed_singular_pascal;
    let id = ctx.schema.identifier().map(|f| f.name.as_str()).unwrap_or("id");
    let path = ctx.layout.queries();
    let types_module = relative_module(&path, &ctx.layout.types().with_extension(""));

    let mut code = banner(ctx);
    code.push_str("import { and, asc, desc, eq, inArray } from 'drizzle-orm'\n");
    code.push_str(&format!("import {{ useDB }} from '{}/server'\n", RUNTIME_PACKAGE));
    code.push_str(&format!("import {{ {} }} from './schema'\n", table));
    code.push_str(&format!(
        "import type {{ {item}, New{item} }} from '{}'\n\n",
        types_module
    ));

    code.push_str("/** Column builder of every field, as declared in ./schema. */\n");
    code.push_str(&format!("export const {} = {{\n", q.column_types));
    for f in &ctx.fields {
        code.push_str(&format!("  {}: '{}',\n", f.field.name, f.mapping.storage.builder));
    }
    code.push_str("} as const\n\n");

    let order_by = if ctx.schema.is_hierarchical() {
        format!("asc({table}.path), asc({table}.order)")
    } else if ctx.schema.is_sortable() {
        format!("asc({table}.order)")
    } else {
        format!("desc({table}.createdAt)")
    };

    code.push_str(&format!(
        r#"export async function {get_all}(teamId: string): Promise<{item}[]> {{
  const db = useDB()
  return await db
    .select()
    .from({table})
    .where(eq({table}.teamId, teamId))
    .orderBy({order_by})
}}

export async function {get_by_ids}(teamId: string, ids: string[]): Promise<{item}[]> {{
  if (ids.length === 0) return []
  const db = useDB()
  return await db
    .select()
    .from({table})
    .where(and(eq({table}.teamId, teamId), inArray({table}.{id}, ids)))
    .orderBy({order_by})
}}

"#,
        get_all = q.get_all,
        get_by_ids = q.get_by_ids,
    ));

    if ctx.schema.is_hierarchical() {
        code.push_str(&format!(
            r#"async function treePosition(teamId: string, parentId: string | null | undefined) {{
  if (!parentId) return {{ path: '/', depth: 0 }}
  const [parent] = await {get_by_ids}(teamId, [parentId])
  if (!parent) {{
    throw createError({{ statusCode: 400, statusMessage: 'Parent not found' }})
  }}
  return {{ path: `${{parent.path}}${{parent.{id}}}/`, depth: parent.depth + 1 }}
}}

export async function {create}(data: New{item}): Promise<{item}> {{
  const db = useDB()
  const position = await treePosition(data.teamId, data.parentId)
  const [created] = await db.insert({table}).values({{ ...data, ...position }}).returning()
  return created
}}

"#,
            get_by_ids = q.get_by_ids,
            create = q.create,
        ));
    } else {
        code.push_str(&format!(
            r#"export async function {create}(data: New{item}): Promise<{item}> {{
  const db = useDB()
  const [created] = await db.insert({table}).values(data).returning()
  return created
}}

"#,
            create = q.create,
        ));
    }

    code.push_str(&format!(
        r#"export async function {update}(
  {id}: string,
  teamId: string,
  data: Partial<New{item}>,
): Promise<{item}> {{
  const db = useDB()
  const [updated] = await db
    .update({table})
    .set({{ ...data, updatedAt: new Date() }})
    .where(and(eq({table}.{id}, {id}), eq({table}.teamId, teamId)))
    .returning()
  if (!updated) {{
    throw createError({{ statusCode: 404, statusMessage: '{label} not found' }})
  }}
  return updated
}}

export async function {delete}({id}: string, teamId: string): Promise<{item}> {{
  const db = useDB()
  const [deleted] = await db
    .delete({table})
    .where(and(eq({table}.{id}, {id}), eq({table}.teamId, teamId)))
    .returning()
  if (!deleted) {{
    throw createError({{ statusCode: 404, statusMessage: '{label} not found' }})
  }}
  return deleted
}}
"#,
        update = q.update,
        delete = q.delete,
        label = n.singular_label,
    ));

    if ctx.schema.is_sortable() {
        let parent = if ctx.schema.is_hierarchical() {
            ", ...(item.parentId !== undefined ? { parentId: item.parentId } : {})"
        } else {
            ""
        };
        code.push_str(&format!(
            r#"
export async function {reorder}(
  teamId: string,
  items: Array<{{ id: string; order: number; parentId?: string | null }}>,
): Promise<void> {{
  const db = useDB()
  await db.transaction(async (tx) => {{
    for (const item of items) {{
      await tx
        .update({table})
        .set({{ order: item.order{parent} }})
        .where(and(eq({table}.{id}, item.id), eq({table}.teamId, teamId)))
    }}
  }})
}}
"#,
            reorder = q.reorder,
        ));
    }

    if ctx.schema.is_hierarchical() {
        code.push_str(&format!(
            r#"
export async function {move_item}(
  {id}: string,
  teamId: string,
  parentId: string | null,
  order: number,
): Promise<{item}> {{
  if (parentId === {id}) {{
    throw createError({{ statusCode: 400, statusMessage: 'An item cannot be its own parent' }})
  }}
  const position = await treePosition(teamId, parentId)
  const db = useDB()
  const [moved] = await db
    .update({table})
    .set({{ parentId, order, ...position, updatedAt: new Date() }})
    .where(and(eq({table}.{id}, {id}), eq({table}.teamId, teamId)))
    .returning()
  if (!moved) {{
    throw createError({{ statusCode: 404, statusMessage: '{label} not found' }})
  }}
  return moved
}}
"#,
            move_item = q.move_item,
            label = n.singular_label,
        ));
    }

    GeneratedArtifact::new(ArtifactKind::Queries, path, code)
}
